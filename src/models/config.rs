use std::sync::Arc;
use serde::Deserialize;
use serenity::prelude::TypeMapKey;

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub token: String,
    pub cmd_prefix: String,
    pub sql_server_ip: String,
    pub sql_server_port: u16,
    pub sql_server_username: String,
    pub sql_server_password: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    // Background feeds report their failures here.
    #[serde(default)]
    pub debug_channel_id: Option<u64>
}

impl TypeMapKey for Config {
    type Value = Arc<Config>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_fall_back() {
        let config: Config = serde_json::from_str(r#"{
            "token": "abc",
            "cmd_prefix": ".",
            "sql_server_ip": "localhost",
            "sql_server_port": 1433,
            "sql_server_username": "sa",
            "sql_server_password": "hunter2"
        }"#).unwrap();

        assert_eq!(config.openai_model, "gpt-3.5-turbo");
        assert_eq!(config.debug_channel_id, None);
        assert_eq!(config.sql_server_port, 1433);
    }

    #[test]
    fn missing_token_is_rejected() {
        let config = serde_json::from_str::<Config>(r#"{ "cmd_prefix": "." }"#);
        assert!(config.is_err());
    }
}
