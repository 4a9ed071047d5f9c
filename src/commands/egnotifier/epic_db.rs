use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId};

use crate::{Database, Error};
use crate::services::database::Scope;

const EPIC: &str = "egnotifier";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpicSettings {
    pub channel: Option<u64>,
    pub posted_games: Vec<String>
}

impl Database {
    pub async fn get_epic(&self, guild_id: GuildId) -> Result<EpicSettings, Error> {
        self.get_setting(Scope::Guild, guild_id.0, EPIC).await
    }

    pub async fn set_epic(&self, guild_id: GuildId, settings: &EpicSettings) -> Result<(), Error> {
        self.set_setting(Scope::Guild, guild_id.0, EPIC, settings).await
    }

    pub async fn set_epic_channel(&self, guild_id: GuildId, channel: Option<ChannelId>) -> Result<(), Error> {
        let mut settings = self.get_epic(guild_id).await?;
        settings.channel = channel.map(|channel| channel.0);
        self.set_epic(guild_id, &settings).await
    }

    pub async fn get_epic_guilds(&self) -> Result<Vec<GuildId>, Error> {
        Ok(self.owners_with_setting(Scope::Guild, EPIC).await?
            .into_iter()
            .map(GuildId)
            .collect())
    }
}
