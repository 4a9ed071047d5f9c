use serde::{Deserialize, Serialize};

use crate::{Database, Error};
use crate::services::database::Scope;

const STEAM: &str = "steamapp";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SteamSettings {
    pub steam_api_key: Option<String>
}

impl Database {
    pub async fn get_steam_api_key(&self) -> Result<Option<String>, Error> {
        let settings: SteamSettings = self.get_setting(Scope::Global, 0, STEAM).await?;
        Ok(settings.steam_api_key.filter(|key| !key.is_empty()))
    }

    pub async fn set_steam_api_key(&self, key: &str) -> Result<(), Error> {
        let settings = SteamSettings { steam_api_key: Some(key.to_string()) };
        self.set_setting(Scope::Global, 0, STEAM, &settings).await
    }
}
