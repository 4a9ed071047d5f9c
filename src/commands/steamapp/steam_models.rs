use std::collections::HashMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct VanityResponse {
    pub response: VanityResult
}

#[derive(Debug, Deserialize)]
pub struct VanityResult {
    #[serde(default)]
    pub steamid: Option<String>,
    pub success: i32
}

#[derive(Debug, Deserialize)]
pub struct PlayerSummariesResponse {
    pub response: PlayerSummaries
}

#[derive(Debug, Deserialize)]
pub struct PlayerSummaries {
    #[serde(default)]
    pub players: Vec<PlayerSummary>
}

#[derive(Debug, Deserialize)]
pub struct PlayerSummary {
    pub steamid: String,
    pub personaname: String,
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default)]
    pub loccountrycode: Option<String>,
    #[serde(default)]
    pub avatarfull: Option<String>,
    #[serde(default)]
    pub timecreated: Option<i64>
}

#[derive(Debug, Deserialize)]
pub struct PlayerBansResponse {
    #[serde(default)]
    pub players: Vec<PlayerBan>
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerBan {
    #[serde(rename = "VACBanned")]
    pub vac_banned: bool,
    #[serde(rename = "NumberOfVACBans")]
    pub number_of_vac_bans: u32,
    pub days_since_last_ban: u32,
    pub economy_ban: String
}

#[derive(Debug, Deserialize)]
pub struct StoreSearch {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub items: Vec<StoreItem>
}

#[derive(Debug, Deserialize)]
pub struct StoreItem {
    pub id: u64,
    pub name: String
}

pub type AppDetailsResponse = HashMap<String, AppDetailsEntry>;

#[derive(Debug, Deserialize)]
pub struct AppDetailsEntry {
    pub success: bool,
    #[serde(default)]
    pub data: Option<AppData>
}

#[derive(Debug, Deserialize)]
pub struct AppData {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub header_image: Option<String>,
    #[serde(default)]
    pub price_overview: Option<PriceOverview>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub release_date: Option<ReleaseDate>,
    /// Usually a number, sometimes a string.
    #[serde(default)]
    pub required_age: serde_json::Value,
    #[serde(default)]
    pub platforms: Platforms
}

#[derive(Debug, Deserialize)]
pub struct PriceOverview {
    pub final_formatted: String
}

#[derive(Debug, Deserialize)]
pub struct ReleaseDate {
    #[serde(default)]
    pub date: String
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Platforms {
    pub windows: bool,
    pub mac: bool,
    pub linux: bool
}
