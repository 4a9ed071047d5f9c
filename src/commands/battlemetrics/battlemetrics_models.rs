use serde::{Deserialize, Serialize};

/// BattleMetrics wraps everything in JSON:API documents; failures come back as `errors`.
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ApiError>
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>
}

impl ApiError {
    pub fn describe(&self) -> String {
        self.detail.clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct Resource<A> {
    pub attributes: A
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub players: u32,
    #[serde(default)]
    pub max_players: u32,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: ServerDetails
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerDetails {
    pub map: Option<String>,
    pub mod_names: Option<Vec<String>>,
    pub mod_links: Option<Vec<String>>
}

#[derive(Debug, Deserialize)]
pub struct CommandResult {
    #[serde(default)]
    pub result: Option<serde_json::Value>
}

#[derive(Debug, Deserialize)]
pub struct BanAttributes {
    #[serde(default)]
    pub reason: Option<String>
}

#[derive(Debug, Serialize)]
pub struct CommandRequest {
    pub data: CommandRequestData
}

#[derive(Debug, Serialize)]
pub struct CommandRequestData {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: CommandRequestAttributes
}

#[derive(Debug, Serialize)]
pub struct CommandRequestAttributes {
    pub command: &'static str,
    pub options: CommandRequestOptions
}

#[derive(Debug, Serialize)]
pub struct CommandRequestOptions {
    pub raw: String
}

impl CommandRequest {
    pub fn raw(command: &str) -> Self {
        CommandRequest {
            data: CommandRequestData {
                kind: "rconCommand",
                attributes: CommandRequestAttributes {
                    command: "raw",
                    options: CommandRequestOptions { raw: command.to_string() }
                }
            }
        }
    }
}
