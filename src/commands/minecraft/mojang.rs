use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{Error, USER_AGENT};

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String
}

/// Resolves a player name to their profile, or `None` if nobody has that name.
pub async fn lookup_profile(client: &Client, player: &str) -> Result<Option<Profile>, Error> {
    let response = client
        .get(format!("https://api.mojang.com/users/profiles/minecraft/{player}"))
        .header("User-Agent", USER_AGENT)
        .send()
        .await?;

    match response.status() {
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(None),
        status if status.is_success() => Ok(Some(response.json::<Profile>().await?)),
        status => Err(format!("Mojang returned HTTP {status}").into())
    }
}

pub fn namemc_url(uuid: &str) -> String {
    format!("https://namemc.com/profile/{uuid}")
}

pub fn crafthead_url(kind: &str, uuid: &str) -> String {
    format!("https://crafthead.net/{kind}/{uuid}")
}
