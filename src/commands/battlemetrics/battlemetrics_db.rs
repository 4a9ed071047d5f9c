use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;

use crate::{Database, Error};
use crate::services::database::Scope;

const BATTLEMETRICS: &str = "battlemetrics";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFeed {
    pub battlemetrics_server_id: String,
    pub discord_channel_id: u64,
    pub bearer_token: String,
    pub embed_image_url: String,
    #[serde(default)]
    pub message_id: Option<u64>
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleMetricsSettings {
    pub servers: Vec<ServerFeed>
}

impl BattleMetricsSettings {
    pub fn find(&self, server_id: &str) -> Option<&ServerFeed> {
        self.servers.iter().find(|server| server.battlemetrics_server_id == server_id)
    }

    /// Stores `(server id, channel id, message id)` results on feeds that still exist.
    /// Returns false if nothing changed.
    pub fn record_message_ids(&mut self, posted: &[(String, u64, u64)]) -> bool {
        let mut changed = false;

        for (server_id, channel_id, message_id) in posted {
            let feeds = self.servers.iter_mut()
                .filter(|feed| &feed.battlemetrics_server_id == server_id && feed.discord_channel_id == *channel_id);

            for feed in feeds {
                if feed.message_id != Some(*message_id) {
                    feed.message_id = Some(*message_id);
                    changed = true;
                }
            }
        }

        changed
    }
}

impl Database {
    pub async fn get_battlemetrics(&self, guild_id: GuildId) -> Result<BattleMetricsSettings, Error> {
        self.get_setting(Scope::Guild, guild_id.0, BATTLEMETRICS).await
    }

    pub async fn set_battlemetrics(&self, guild_id: GuildId, settings: &BattleMetricsSettings) -> Result<(), Error> {
        self.set_setting(Scope::Guild, guild_id.0, BATTLEMETRICS, settings).await
    }

    pub async fn add_battlemetrics_server(&self, guild_id: GuildId, server: ServerFeed) -> Result<(), Error> {
        let mut settings = self.get_battlemetrics(guild_id).await?;
        settings.servers.push(server);
        self.set_battlemetrics(guild_id, &settings).await
    }

    pub async fn clear_battlemetrics(&self, guild_id: GuildId) -> Result<(), Error> {
        self.clear_setting(Scope::Guild, guild_id.0, BATTLEMETRICS).await?;
        Ok(())
    }

    pub async fn get_battlemetrics_guilds(&self) -> Result<Vec<GuildId>, Error> {
        Ok(self.owners_with_setting(Scope::Guild, BATTLEMETRICS).await?
            .into_iter()
            .map(GuildId)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_server_by_id() {
        let settings: BattleMetricsSettings = serde_json::from_str(r#"{"servers": [
            {"battlemetrics_server_id": "123", "discord_channel_id": 9, "bearer_token": "t", "embed_image_url": "https://img"}
        ]}"#).unwrap();

        assert_eq!(settings.find("123").map(|s| s.discord_channel_id), Some(9));
        assert_eq!(settings.find("123").and_then(|s| s.message_id), None);
        assert!(settings.find("456").is_none());
    }

    fn feed(server_id: &str, channel_id: u64) -> ServerFeed {
        ServerFeed {
            battlemetrics_server_id: server_id.to_string(),
            discord_channel_id: channel_id,
            bearer_token: "t".to_string(),
            embed_image_url: "https://img".to_string(),
            message_id: None
        }
    }

    #[test]
    fn message_ids_land_on_current_feeds() {
        let mut settings = BattleMetricsSettings { servers: vec![feed("123", 9), feed("456", 9)] };

        assert!(settings.record_message_ids(&[("123".to_string(), 9, 77)]));
        assert_eq!(settings.find("123").and_then(|s| s.message_id), Some(77));
        assert_eq!(settings.find("456").and_then(|s| s.message_id), None);
        assert!(!settings.record_message_ids(&[("123".to_string(), 9, 77)]));
    }

    #[test]
    fn cleared_or_moved_feeds_are_not_revived() {
        let mut cleared = BattleMetricsSettings::default();
        assert!(!cleared.record_message_ids(&[("123".to_string(), 9, 77)]));
        assert!(cleared.servers.is_empty());

        let mut moved = BattleMetricsSettings { servers: vec![feed("123", 10)] };
        assert!(!moved.record_message_ids(&[("123".to_string(), 9, 77)]));
        assert_eq!(moved.find("123").and_then(|s| s.message_id), None);
    }
}
