use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;

use crate::{Database, Error};
use crate::services::database::Scope;

const DECKARD_CAIN: &str = "deckardcain";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CainSettings {
    pub api_key: Option<String>
}

impl Database {
    pub async fn get_cain_api_key(&self, guild_id: GuildId) -> Result<Option<String>, Error> {
        let settings: CainSettings = self.get_setting(Scope::Guild, guild_id.0, DECKARD_CAIN).await?;
        Ok(settings.api_key)
    }

    pub async fn set_cain_api_key(&self, guild_id: GuildId, api_key: &str) -> Result<(), Error> {
        let settings = CainSettings { api_key: Some(api_key.to_string()) };
        self.set_setting(Scope::Guild, guild_id.0, DECKARD_CAIN, &settings).await
    }
}
