use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId};

use tokio::sync::Mutex;

use crate::{Database, Error};
use crate::services::database::{locked, Scope};

const AUTOVOICE: &str = "autovoice";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoVoiceSettings {
    pub trigger_channel_id: Option<u64>,
    pub control_channel_id: Option<u64>,
    pub control_message_id: Option<u64>,
    pub created_channels: Vec<u64>
}

impl AutoVoiceSettings {
    /// Returns false if nothing changed.
    pub fn track(&mut self, channel_id: ChannelId) -> bool {
        if self.created_channels.contains(&channel_id.0) {
            return false;
        }

        self.created_channels.push(channel_id.0);
        true
    }

    pub fn forget(&mut self, channel_id: ChannelId) -> bool {
        let before = self.created_channels.len();
        self.created_channels.retain(|id| *id != channel_id.0);
        before != self.created_channels.len()
    }
}

impl Database {
    pub async fn get_autovoice(&self, guild_id: GuildId) -> Result<AutoVoiceSettings, Error> {
        self.get_setting(Scope::Guild, guild_id.0, AUTOVOICE).await
    }

    pub async fn set_autovoice(&self, guild_id: GuildId, settings: &AutoVoiceSettings) -> Result<(), Error> {
        self.set_setting(Scope::Guild, guild_id.0, AUTOVOICE, settings).await
    }

    pub async fn get_autovoice_guilds(&self) -> Result<Vec<GuildId>, Error> {
        Ok(self.owners_with_setting(Scope::Guild, AUTOVOICE).await?
            .into_iter()
            .map(GuildId)
            .collect())
    }

    /// Applies `change` under `lock`; the row is only written back when `change` reports a difference.
    pub async fn update_autovoice<F>(&self, lock: &Mutex<()>, guild_id: GuildId, change: F) -> Result<AutoVoiceSettings, Error>
    where
        F: FnOnce(&mut AutoVoiceSettings) -> bool
    {
        locked(lock, async {
            let mut settings = self.get_autovoice(guild_id).await?;
            if change(&mut settings) {
                self.set_autovoice(guild_id, &settings).await?;
            }

            Ok(settings)
        }).await
    }

    pub async fn track_created_channel(&self, lock: &Mutex<()>, guild_id: GuildId, channel_id: ChannelId) -> Result<(), Error> {
        self.update_autovoice(lock, guild_id, |settings| settings.track(channel_id)).await?;
        Ok(())
    }

    pub async fn forget_created_channel(&self, lock: &Mutex<()>, guild_id: GuildId, channel_id: ChannelId) -> Result<(), Error> {
        self.update_autovoice(lock, guild_id, |settings| settings.forget(channel_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_deserialize_to_defaults() {
        let settings: AutoVoiceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, AutoVoiceSettings::default());
    }

    #[test]
    fn tracking_ignores_duplicates() {
        let mut settings = AutoVoiceSettings::default();

        assert!(settings.track(ChannelId(10)));
        assert!(!settings.track(ChannelId(10)));
        assert!(settings.track(ChannelId(11)));
        assert_eq!(settings.created_channels, vec![10, 11]);

        assert!(settings.forget(ChannelId(10)));
        assert!(!settings.forget(ChannelId(10)));
        assert_eq!(settings.created_channels, vec![11]);
    }
}
