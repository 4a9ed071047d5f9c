mod steam_api;
mod steam_db;
mod steam_models;
mod steamid;

use std::time::Duration;
use chrono::Utc;
use reqwest::Client;
use tracing::{error, warn};

use crate::{HoradricContext, Database, db, horadricdb, Error};
use steam_models::{AppData, PlayerBan, PlayerSummary, StoreItem};
use steamid::{SteamId, SteamInput};

const BLUE: u32 = 0x3498DB;
const FIELD_LIMIT: usize = 1024;
const NO_KEY: &str = "The Steam API key has not been set. Please set it using the `setsteamapikey` command.";

type ApplicationContext<'a> = poise::ApplicationContext<'a, (), Error>;

#[derive(Debug, poise::Modal)]
#[name = "Enter Steam API Key"]
struct SteamApiKeyModal {
    #[name = "Steam API Key"]
    #[placeholder = "Enter your Steam API key..."]
    steam_api_key: String
}

fn account_age(time_created: Option<i64>, now: i64) -> String {
    match time_created {
        Some(created) => format!("{} years", (now - created).max(0) / 86_400 / 365),
        None => "Unknown years".to_string()
    }
}

fn profile_info(player: &PlayerSummary, now: i64) -> String {
    format!(
        "**Name:** {}\n**Country:** {}\n**Account Age:** {}",
        player.realname.as_deref().unwrap_or("Unknown"),
        player.loccountrycode.as_deref().unwrap_or("Unknown"),
        account_age(player.timecreated, now)
    )
}

fn id_info(id: SteamId) -> String {
    format!("**SteamID:** {}\n**SteamID3:** {}\n**SteamID64:** {}", id.as_steam2(), id.as_steam3(), id.0)
}

fn ban_info(ban: &PlayerBan) -> String {
    format!(
        "**VAC Banned:** {}\n**Bans:** {} (Last: {} days ago)\n**Trade Banned:** {}",
        ban.vac_banned, ban.number_of_vac_bans, ban.days_since_last_ban, ban.economy_ban
    )
}

/// An exact (case-insensitive) name match beats the store's own ranking.
fn best_match<'a>(items: &'a [StoreItem], term: &str) -> Option<&'a StoreItem> {
    items.iter()
        .find(|item| item.name.to_lowercase() == term.to_lowercase())
        .or_else(|| items.first())
}

fn truncate_about(about: &str) -> String {
    if about.chars().count() > FIELD_LIMIT {
        let cut: String = about.chars().take(FIELD_LIMIT - 3).collect();
        format!("{cut}...")
    } else {
        about.to_string()
    }
}

fn required_age(age: &serde_json::Value) -> String {
    let age = match age {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0
    };

    if age > 0 {
        format!("{age}+")
    } else {
        "None".to_string()
    }
}

fn platforms(game: &AppData) -> String {
    let available = [
        ("Windows", game.platforms.windows),
        ("Mac", game.platforms.mac),
        ("Linux", game.platforms.linux)
    ];

    available.iter()
        .filter(|(_, supported)| *supported)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_unknown(text: String) -> String {
    if text.is_empty() { "Unknown".to_string() } else { text }
}

#[poise::command(
    prefix_command,
    owners_only,
    description_localized("en-US", "Set the Steam API key for this bot.")
)]
pub async fn setsteamapikey(
    ctx: HoradricContext<'_>,
    #[description = "The Steam API key."] key: String)
-> Result<(), Error> {
    let sctx = ctx.serenity_context();
    let db = horadricdb!(ctx);
    db.set_steam_api_key(key.trim()).await?;

    // The key should not linger in chat.
    if let poise::Context::Prefix(prefix) = ctx {
        if let Err(ex) = prefix.msg.delete(sctx).await {
            warn!("Failed to delete message holding the Steam API key: {}", ex);
            ctx.say("I do not have permission to delete messages.").await?;
        }
    }

    let confirmation = ctx.say("Steam API key has been set for this bot.").await?.into_message().await?;

    tokio::time::sleep(Duration::from_secs(5)).await;

    if let Err(ex) = confirmation.delete(sctx).await {
        warn!("Failed to delete Steam API key confirmation: {}", ex);
    }

    Ok(())
}

#[poise::command(
    slash_command,
    owners_only,
    description_localized("en-US", "Set the Steam API key.")
)]
pub async fn steamapikey(ctx: ApplicationContext<'_>) -> Result<(), Error> {
    use poise::Modal as _;

    let Some(modal) = SteamApiKeyModal::execute(ctx).await? else {
        return Ok(());
    };

    let db = db!(ctx.serenity_context());
    let reply = match db.set_steam_api_key(modal.steam_api_key.trim()).await {
        Ok(()) => "Steam API key has been set!".to_string(),
        Err(ex) => {
            error!("Failed to store Steam API key: {}", ex);
            format!("Something went wrong: {ex}")
        }
    };

    poise::send_application_reply(ctx, |m| m.content(reply).ephemeral(true)).await?;

    Ok(())
}

async fn resolve_id(client: &Client, key: &str, input: &str) -> Result<Option<SteamId>, Error> {
    match steamid::parse_input(input) {
        None => Ok(None),
        Some(SteamInput::Id(id)) => Ok(Some(id)),
        Some(SteamInput::Vanity(vanity)) if vanity.is_empty() => Ok(None),
        Some(SteamInput::Vanity(vanity)) => steam_api::resolve_vanity(client, key, &vanity).await
    }
}

#[poise::command(
    slash_command,
    description_localized("en-US", "Search for user profiles on the Steam database.")
)]
pub async fn steamprofile(
    ctx: HoradricContext<'_>,
    #[description = "SteamID64, SteamID, or custom URL."] steam: String)
-> Result<(), Error> {
    let db = horadricdb!(ctx);
    let Some(key) = db.get_steam_api_key().await? else {
        ctx.send(|m| m.content(NO_KEY).ephemeral(true)).await?;
        return Ok(());
    };

    // Up to three Steam calls follow.
    ctx.defer().await?;

    let client = Client::new();

    let id = match resolve_id(&client, &key, &steam).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            ctx.send(|m| m.content("Invalid steam profile. Please provide a valid SteamID64, SteamID, or custom URL.").ephemeral(true)).await?;
            return Ok(());
        }
        Err(ex) => {
            error!("Failed to resolve Steam profile {}: {}", steam, ex);
            ctx.send(|m| m.content(ex.to_string()).ephemeral(true)).await?;
            return Ok(());
        }
    };

    let player = match steam_api::player_summary(&client, &key, id).await {
        Ok(Some(player)) => player,
        Ok(None) => {
            ctx.send(|m| m.content("Unable to fetch the player information.").ephemeral(true)).await?;
            return Ok(());
        }
        Err(ex) => {
            error!("Failed to get player summary for {}: {}", id.0, ex);
            ctx.send(|m| m.content("Failed to get player summaries.").ephemeral(true)).await?;
            return Ok(());
        }
    };

    let ban = match steam_api::player_bans(&client, &key, id).await {
        Ok(ban) => ban,
        Err(ex) => {
            error!("Failed to get player bans for {}: {}", id.0, ex);
            ctx.send(|m| m.content("Failed to get player bans.").ephemeral(true)).await?;
            return Ok(());
        }
    };

    let now = Utc::now().timestamp();
    let profile_id = player.steamid.parse().map(SteamId).unwrap_or(id);

    ctx.send(|m| m.embed(|e| {
        e.title(&player.personaname)
            .url(format!("https://steamcommunity.com/profiles/{}", profile_id.0))
            .colour(BLUE)
            .field("Profile Info", profile_info(&player, now), true)
            .field("SteamID", id_info(profile_id), true)
            .footer(|f| f.text("Powered by Steam"));

        if let Some(avatar) = &player.avatarfull {
            e.thumbnail(avatar);
        }

        if let Some(ban) = &ban {
            e.field("Ban Info", ban_info(ban), true);
        }

        e
    })).await?;

    Ok(())
}

#[poise::command(
    slash_command,
    description_localized("en-US", "Search for games on the Steam database.")
)]
pub async fn steamgame(
    ctx: HoradricContext<'_>,
    #[description = "Name of the game."] game: String)
-> Result<(), Error> {
    let client = Client::new();

    let search = match steam_api::store_search(&client, &game).await {
        Ok(search) => search,
        Err(ex) => {
            error!("Failed to search the Steam store for {}: {}", game, ex);
            ctx.send(|m| m.content("Game not found.").ephemeral(true)).await?;
            return Ok(());
        }
    };

    let Some(item) = best_match(&search.items, &game).filter(|_| search.total > 0) else {
        ctx.send(|m| m.content("Game not found.").ephemeral(true)).await?;
        return Ok(());
    };

    let app_id = item.id;

    let details = match steam_api::app_details(&client, app_id).await {
        Ok(Some(details)) => details,
        Ok(None) => {
            ctx.send(|m| m.content("Unable to fetch the game information.").ephemeral(true)).await?;
            return Ok(());
        }
        Err(ex) => {
            error!("Failed to get app details for {}: {}", app_id, ex);
            ctx.send(|m| m.content("Unable to fetch the game information.").ephemeral(true)).await?;
            return Ok(());
        }
    };

    let price = details.price_overview.as_ref()
        .map(|price| price.final_formatted.clone())
        .unwrap_or_else(|| "Free".to_string());
    let release_date = details.release_date.as_ref()
        .map(|release| release.date.clone())
        .unwrap_or_default();

    ctx.send(|m| m.embed(|e| {
        e.title(&details.name)
            .url(format!("https://store.steampowered.com/app/{app_id}"))
            .colour(BLUE)
            .field("About This Game", or_unknown(truncate_about(&details.short_description)), false)
            .field("Price", price, true)
            .field("Publisher", or_unknown(details.publishers.join(", ")), true)
            .field("Developer", or_unknown(details.developers.join(", ")), true)
            .field("Release Date", or_unknown(release_date), true)
            .field("App ID", app_id, true)
            .field("Required Age", required_age(&details.required_age), true)
            .field("Platforms", or_unknown(platforms(&details)), false)
            .footer(|f| f.text("Powered by Steam"));

        if let Some(header) = &details.header_image {
            e.image(header);
        }

        e
    })).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(created: Option<i64>) -> PlayerSummary {
        PlayerSummary {
            steamid: "76561197960287930".to_string(),
            personaname: "Rabscuttle".to_string(),
            realname: None,
            loccountrycode: Some("US".to_string()),
            avatarfull: None,
            timecreated: created
        }
    }

    #[test]
    fn account_age_counts_whole_years() {
        let year = 365 * 86_400;
        assert_eq!(account_age(Some(0), 3 * year + 100), "3 years");
        assert_eq!(account_age(None, 0), "Unknown years");
    }

    #[test]
    fn profile_info_fills_unknowns() {
        let info = profile_info(&player(None), 0);
        assert_eq!(info, "**Name:** Unknown\n**Country:** US\n**Account Age:** Unknown years");
    }

    #[test]
    fn id_info_lists_every_format() {
        assert_eq!(
            id_info(SteamId(76561197960287930)),
            "**SteamID:** STEAM_1:0:11101\n**SteamID3:** [U:1:22202]\n**SteamID64:** 76561197960287930"
        );
    }

    #[test]
    fn exact_names_win() {
        let items = vec![
            StoreItem { id: 1, name: "Diablo II: Resurrected".to_string() },
            StoreItem { id: 2, name: "Diablo".to_string() }
        ];

        assert_eq!(best_match(&items, "diablo").map(|item| item.id), Some(2));
        assert_eq!(best_match(&items, "diablo 4").map(|item| item.id), Some(1));
        assert!(best_match(&[], "diablo").is_none());
    }

    #[test]
    fn about_is_capped() {
        let long = "a".repeat(2000);
        let about = truncate_about(&long);
        assert_eq!(about.chars().count(), FIELD_LIMIT);
        assert!(about.ends_with("..."));
        assert_eq!(truncate_about("short"), "short");
    }

    #[test]
    fn required_age_accepts_strings() {
        assert_eq!(required_age(&serde_json::json!(17)), "17+");
        assert_eq!(required_age(&serde_json::json!("18")), "18+");
        assert_eq!(required_age(&serde_json::json!(0)), "None");
    }

    #[test]
    fn platforms_list_supported_only() {
        let game: AppData = serde_json::from_str(r#"{
            "name": "Diablo",
            "platforms": {"windows": true, "mac": false, "linux": true}
        }"#).unwrap();

        assert_eq!(platforms(&game), "Windows, Linux");
        assert_eq!(required_age(&game.required_age), "None");
    }
}
