use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{Error, USER_AGENT};
use super::steam_models::*;
use super::steamid::SteamId;

const WEB_API: &str = "https://api.steampowered.com/ISteamUser";
const STORE_API: &str = "https://store.steampowered.com/api";

async fn get<T: DeserializeOwned>(client: &Client, url: &str, query: &[(&str, &str)]) -> Result<T, Error> {
    Ok(client
        .get(url)
        .query(query)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json::<T>()
        .await?)
}

/// `None` when Steam has no profile under that custom URL.
pub async fn resolve_vanity(client: &Client, key: &str, vanity: &str) -> Result<Option<SteamId>, Error> {
    let response: VanityResponse = get(client, &format!("{WEB_API}/ResolveVanityURL/v0001/"), &[("key", key), ("vanityurl", vanity)])
        .await
        .map_err(|ex| format!("Failed to resolve Steam vanity URL: {ex}"))?;

    if response.response.success != 1 {
        return Ok(None);
    }

    Ok(response.response.steamid.and_then(|id| id.parse().ok()).map(SteamId))
}

pub async fn player_summary(client: &Client, key: &str, id: SteamId) -> Result<Option<PlayerSummary>, Error> {
    let id = id.0.to_string();
    let response: PlayerSummariesResponse = get(client, &format!("{WEB_API}/GetPlayerSummaries/v0002/"), &[("key", key), ("steamids", id.as_str())]).await?;

    Ok(response.response.players.into_iter().next())
}

pub async fn player_bans(client: &Client, key: &str, id: SteamId) -> Result<Option<PlayerBan>, Error> {
    let id = id.0.to_string();
    let response: PlayerBansResponse = get(client, &format!("{WEB_API}/GetPlayerBans/v1/"), &[("key", key), ("steamids", id.as_str())]).await?;

    Ok(response.players.into_iter().next())
}

pub async fn store_search(client: &Client, term: &str) -> Result<StoreSearch, Error> {
    get(client, &format!("{STORE_API}/storesearch/"), &[("cc", "us"), ("l", "en"), ("term", term)]).await
}

pub async fn app_details(client: &Client, app_id: u64) -> Result<Option<AppData>, Error> {
    let app_id = app_id.to_string();
    let mut response: AppDetailsResponse = get(client, &format!("{STORE_API}/appdetails"), &[("appids", app_id.as_str()), ("cc", "us")]).await?;

    Ok(response.remove(&app_id)
        .filter(|entry| entry.success)
        .and_then(|entry| entry.data))
}
