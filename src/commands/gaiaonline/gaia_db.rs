use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;

use crate::{Database, Error};
use crate::services::database::Scope;

const GAIA: &str = "gaiaonline";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GaiaProfile {
    pub gaia_username: Option<String>
}

/// Where one user's profile lives; other cogs' user settings sit beside it.
fn profile_key(user_id: UserId) -> (Scope, u64, &'static str) {
    (Scope::User, user_id.0, GAIA)
}

impl Database {
    pub async fn get_gaia_username(&self, user_id: UserId) -> Result<Option<String>, Error> {
        let (scope, owner, name) = profile_key(user_id);
        let profile: GaiaProfile = self.get_setting(scope, owner, name).await?;
        Ok(profile.gaia_username)
    }

    pub async fn set_gaia_username(&self, user_id: UserId, username: &str) -> Result<(), Error> {
        let (scope, owner, name) = profile_key(user_id);
        let profile = GaiaProfile { gaia_username: Some(username.to_string()) };
        self.set_setting(scope, owner, name, &profile).await
    }

    /// Removes only the Gaia profile, leaving the user's other settings alone.
    pub async fn clear_gaia_username(&self, user_id: UserId) -> Result<bool, Error> {
        let (scope, owner, name) = profile_key(user_id);
        self.clear_setting(scope, owner, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_is_one_named_user_setting() {
        assert_eq!(profile_key(UserId(42)), (Scope::User, 42, "gaiaonline"));
    }
}
