mod battlemetrics_api;
mod battlemetrics_db;
mod battlemetrics_models;

use std::time::Duration;
use serenity::builder::CreateEmbed;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId};
use tokio::time;
use tracing::{error, info};

use crate::{HoradricContext, Database, db, horadricdb, config, Error};
use battlemetrics_api::BattleMetrics;
use battlemetrics_db::ServerFeed;
use battlemetrics_models::{ServerAttributes, CommandResult};

const ORANGE: u32 = 0xF3A316;
const FIELD_LIMIT: usize = 1024;
const MESSAGE_LIMIT: usize = 2000;
const NOT_CONFIGURED: &str = "Server configuration not found.";

/// Splits mod links into embed field values, each at most 1024 characters.
fn mod_fields(names: &[String], links: &[String]) -> Vec<String> {
    let lines = names.iter().zip(links)
        .map(|(name, link)| format!("[{name}]({link})"))
        .collect::<Vec<_>>();

    chunk_lines(&lines, FIELD_LIMIT)
}

/// Cuts a line into pieces of at most `max` bytes without breaking a character.
fn split_long_line(line: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;

    while rest.len() > max {
        let mut cut = max;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }

        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }

    pieces.push(rest);
    pieces
}

/// Joins lines into chunks under `limit`, hard-splitting any line that is too long on its own.
fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    // Room for the newline after each piece.
    let max_piece = limit.saturating_sub(1).max(1);

    for line in lines {
        for piece in split_long_line(line, max_piece) {
            if !current.is_empty() && current.len() + piece.len() + 1 > limit {
                chunks.push(std::mem::take(&mut current));
            }

            current.push_str(piece);
            current.push('\n');
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn server_embed(server: &ServerAttributes, image_url: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::default();

    embed.title("Server Info")
        .colour(ORANGE)
        .field("Server Name", server.name.as_deref().unwrap_or("N/A"), true)
        .field("Players Online", format!("{}/{}", server.players, server.max_players), true)
        .field("Map", server.details.map.as_deref().unwrap_or("N/A"), true)
        .field("Status", server.status.as_deref().unwrap_or("N/A"), true)
        .image(image_url);

    match (&server.details.mod_names, &server.details.mod_links) {
        (Some(names), Some(links)) => {
            for (i, value) in mod_fields(names, links).into_iter().enumerate() {
                embed.field(format!("Mods (Part {})", i + 1), value, false);
            }
        }
        _ => {
            embed.field("Mods", "No mod information available", false);
        }
    }

    embed
}

fn command_output(result: &CommandResult) -> String {
    match &result.result {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new()
    }
}

async fn report(ctx: &Context, message: &str) {
    error!("{}", message);

    let config = config!(ctx);
    if let Some(debug_channel) = config.debug_channel_id.map(ChannelId) {
        if let Err(ex) = debug_channel.say(&ctx.http, message).await {
            error!("Failed to reach debug channel: {}", ex);
        }
    }
}

/// Posts or edits the status message; returns the id to remember.
async fn refresh_feed(ctx: &Context, feed: &ServerFeed) -> Result<u64, Error> {
    let api = BattleMetrics::new(&feed.bearer_token);
    let document = api.server_info(&feed.battlemetrics_server_id).await?;

    let Some(server) = document.data else {
        let reason = document.errors.first().map(|ex| ex.describe()).unwrap_or_else(|| "no data".to_string());
        return Err(format!("Server {} returned {}", feed.battlemetrics_server_id, reason).into());
    };

    let channel_id = ChannelId(feed.discord_channel_id);
    if ctx.cache.guild_channel(channel_id).is_none() {
        return Err("Channel not found!".into());
    }

    let embed = server_embed(&server.attributes, &feed.embed_image_url);

    if let Some(message_id) = feed.message_id {
        if let Ok(mut message) = channel_id.message(&ctx.http, message_id).await {
            message.edit(ctx, |m| m.set_embed(embed)).await?;
            return Ok(message_id);
        }
    }

    let message = channel_id.send_message(&ctx.http, |m| m.set_embed(embed)).await?;

    Ok(message.id.0)
}

async fn refresh_guild(ctx: &Context, db: &Database, guild_id: GuildId) -> Result<(), Error> {
    let settings = db.get_battlemetrics(guild_id).await?;
    let mut posted = Vec::new();

    for feed in &settings.servers {
        match refresh_feed(ctx, feed).await {
            Ok(message_id) if feed.message_id != Some(message_id) => {
                posted.push((feed.battlemetrics_server_id.clone(), feed.discord_channel_id, message_id));
            }
            Ok(_) => {}
            Err(ex) => report(ctx, &format!("Error updating server info: {ex}")).await
        }
    }

    if posted.is_empty() {
        return Ok(());
    }

    // setserver or clearservers may have run while we were posting.
    let mut current = db.get_battlemetrics(guild_id).await?;
    if current.record_message_ids(&posted) {
        db.set_battlemetrics(guild_id, &current).await?;
    }

    Ok(())
}

pub async fn update_server_feeds(ctx: Context) {
    let mut interval_half_hour = time::interval(Duration::from_secs(30 * 60));
    loop {
        interval_half_hour.tick().await;
        let db = db!(ctx);

        let guilds = match db.get_battlemetrics_guilds().await {
            Ok(guilds) => guilds,
            Err(ex) => {
                error!("Failed to load BattleMetrics guilds: {}", ex);
                continue;
            }
        };

        for guild_id in guilds {
            if let Err(ex) = refresh_guild(&ctx, &db, guild_id).await {
                report(&ctx, &format!("Error updating server info: {ex}")).await;
            }
        }

        info!("Refreshed BattleMetrics server feeds");
    }
}

async fn find_feed(ctx: HoradricContext<'_>, server_id: &str) -> Result<Option<ServerFeed>, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(None);
    };

    let db = horadricdb!(ctx);
    let settings = db.get_battlemetrics(guild_id).await?;

    match settings.find(server_id) {
        Some(feed) => Ok(Some(feed.clone())),
        None => {
            ctx.say(NOT_CONFIGURED).await?;
            Ok(None)
        }
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    owners_only,
    description_localized("en-US", "Add a BattleMetrics server status feed.")
)]
pub async fn setserver(
    ctx: HoradricContext<'_>,
    #[description = "The BattleMetrics server ID."] battlemetrics_server_id: String,
    #[description = "The channel ID to post in."] discord_channel_id: u64,
    #[description = "The BattleMetrics API token."] bearer_token: String,
    #[description = "The image shown in the feed."] embed_image_url: String)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    db.add_battlemetrics_server(guild_id, ServerFeed {
        battlemetrics_server_id,
        discord_channel_id,
        bearer_token,
        embed_image_url,
        message_id: None
    }).await?;

    ctx.send(|m| m.content("Server configuration added.").ephemeral(true)).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    owners_only,
    description_localized("en-US", "Send an RCON command to a BattleMetrics server.")
)]
pub async fn rcon(
    ctx: HoradricContext<'_>,
    #[description = "The BattleMetrics server ID."] server_id: String,
    #[description = "The console command."] #[rest] command: String)
-> Result<(), Error> {
    let Some(feed) = find_feed(ctx, &server_id).await? else {
        return Ok(());
    };

    ctx.defer().await?;

    let api = BattleMetrics::new(&feed.bearer_token);
    let document = match api.send_console_command(&server_id, &command).await {
        Ok(document) => document,
        Err(ex) => {
            error!("Failed to send RCON command to {}: {}", server_id, ex);
            ctx.say(format!("An error occurred: {ex}")).await?;
            return Ok(());
        }
    };

    if let Some(ex) = document.errors.first() {
        ctx.say(format!(
            "<@{}> something went wrong:\nThere was an error with that command!\n**RESPONSE**\n{}",
            ctx.author().id, ex.describe()
        )).await?;
        return Ok(());
    }

    let output = document.data.map(|data| command_output(&data.attributes)).unwrap_or_default();
    ctx.say(format!("Successfully ran the command!\n**RESULTS**\n{output}")).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    owners_only,
    description_localized("en-US", "Show the ban list of a BattleMetrics server.")
)]
pub async fn banlist(
    ctx: HoradricContext<'_>,
    #[description = "The BattleMetrics server ID."] battlemetrics_server_id: String)
-> Result<(), Error> {
    let Some(feed) = find_feed(ctx, &battlemetrics_server_id).await? else {
        return Ok(());
    };

    ctx.defer().await?;

    let api = BattleMetrics::new(&feed.bearer_token);
    let document = match api.ban_list(&battlemetrics_server_id).await {
        Ok(document) => document,
        Err(ex) => {
            error!("Failed to fetch ban list for {}: {}", battlemetrics_server_id, ex);
            ctx.say(format!("Error fetching ban list: {ex}")).await?;
            return Ok(());
        }
    };

    let Some(bans) = document.data else {
        ctx.say("No ban list data found.").await?;
        return Ok(());
    };

    let mut lines = vec!["Ban List:".to_string()];
    lines.extend(bans.iter().map(|ban| {
        format!("- {}", ban.attributes.reason.as_deref().unwrap_or("No reason provided"))
    }));

    for chunk in chunk_lines(&lines, MESSAGE_LIMIT) {
        ctx.say(chunk).await?;
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    owners_only,
    description_localized("en-US", "Remove every BattleMetrics server feed.")
)]
pub async fn clearservers(ctx: HoradricContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    db.clear_battlemetrics(guild_id).await?;

    ctx.say("All server configurations have been cleared.").await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(count: usize) -> (Vec<String>, Vec<String>) {
        let names = (0..count).map(|i| format!("Mod number {i}")).collect();
        let links = (0..count).map(|i| format!("https://steamcommunity.com/sharedfiles/filedetails/?id={i:010}")).collect();
        (names, links)
    }

    #[test]
    fn few_mods_fit_one_field() {
        let (names, links) = mods(3);
        let fields = mod_fields(&names, &links);

        assert_eq!(fields.len(), 1);
        assert!(fields[0].starts_with("[Mod number 0](https://steamcommunity.com"));
        assert_eq!(fields[0].lines().count(), 3);
    }

    #[test]
    fn many_mods_split_under_field_limit() {
        let (names, links) = mods(60);
        let fields = mod_fields(&names, &links);

        assert!(fields.len() > 1);
        assert!(fields.iter().all(|field| field.len() <= FIELD_LIMIT));
        assert_eq!(fields.iter().map(|field| field.lines().count()).sum::<usize>(), 60);
    }

    #[test]
    fn no_mods_no_fields() {
        assert!(mod_fields(&[], &[]).is_empty());
    }

    #[test]
    fn command_output_unwraps_strings() {
        let result: CommandResult = serde_json::from_str(r#"{"result": "Kicked player"}"#).unwrap();
        assert_eq!(command_output(&result), "Kicked player");

        let result: CommandResult = serde_json::from_str(r#"{"result": {"ok": true}}"#).unwrap();
        assert_eq!(command_output(&result), r#"{"ok":true}"#);
    }

    #[test]
    fn errors_are_read_from_documents() {
        let document: battlemetrics_models::Document<battlemetrics_models::Resource<CommandResult>> =
            serde_json::from_str(r#"{"errors": [{"title": "Forbidden", "detail": "Missing rcon permission"}]}"#).unwrap();

        assert!(document.data.is_none());
        assert_eq!(document.errors[0].describe(), "Missing rcon permission");
    }

    #[test]
    fn oversized_lines_are_split() {
        let lines = vec!["a".repeat(5000), "short".to_string()];
        let chunks = chunk_lines(&lines, MESSAGE_LIMIT);

        assert!(chunks.iter().all(|chunk| chunk.len() <= MESSAGE_LIMIT));
        assert_eq!(chunks.concat().matches('a').count(), 5000);
        assert!(chunks.last().unwrap().ends_with("short\n"));
    }

    #[test]
    fn splitting_respects_characters() {
        let line = "é".repeat(10);
        let pieces = split_long_line(&line, 5);

        assert!(pieces.iter().all(|piece| piece.len() <= 5));
        assert_eq!(pieces.concat(), line);
    }

    #[test]
    fn one_huge_mod_link_still_fits_fields() {
        let names = vec!["x".repeat(3000)];
        let links = vec!["https://example.com".to_string()];

        assert!(mod_fields(&names, &links).iter().all(|field| field.len() <= FIELD_LIMIT));
    }

    #[test]
    fn ban_lines_chunk_under_message_limit() {
        let lines: Vec<String> = (0..200).map(|i| format!("- reason {i} for a rather long ban explanation")).collect();
        let chunks = chunk_lines(&lines, MESSAGE_LIMIT);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| chunk.len() <= MESSAGE_LIMIT));
    }
}
