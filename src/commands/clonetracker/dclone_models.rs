use serde::{Deserialize, Deserializer};

/// diablo2.io sends numbers as strings, or not, depending on the day.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String)
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DcloneStatus {
    #[serde(deserialize_with = "string_or_number")]
    pub progress: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub timestamped: i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strings_and_numbers() {
        let statuses: Vec<DcloneStatus> = serde_json::from_str(
            r#"[{"region":"1","ladder":"2","hc":"2","progress":"3","timestamped":"1700000000"},
                {"progress":5,"timestamped":1700000100}]"#
        ).unwrap();

        assert_eq!(statuses[0].progress, 3);
        assert_eq!(statuses[0].timestamped, 1700000000);
        assert_eq!(statuses[1].progress, 5);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<DcloneStatus>(r#"{"progress":"soon","timestamped":"0"}"#).is_err());
    }
}
