mod epic_db;
mod epic_models;

use std::time::Duration;
use chrono::DateTime;
use reqwest::Client;
use serenity::client::Context;
use serenity::model::channel::GuildChannel;
use serenity::model::id::ChannelId;
use tokio::time;
use tracing::{error, info, warn};

use crate::{HoradricContext, Database, db, horadricdb, Error, USER_AGENT};
use epic_models::{FreeGamesResponse, Game};

const PROMOTIONS_URL: &str = "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions";

async fn fetch_games() -> Result<Vec<Game>, Error> {
    let response = Client::new()
        .get(PROMOTIONS_URL)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json::<FreeGamesResponse>()
        .await?;

    Ok(response.data.catalog.search_store.elements)
}

/// Free games this guild has not seen yet, in store order.
fn select_new_free_games<'a>(games: &'a [Game], posted: &[String]) -> Vec<&'a Game> {
    games.iter()
        .filter(|game| game.is_free_now())
        .filter(|game| !posted.contains(&game.id))
        .collect()
}

fn format_until(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(date) => format!("<t:{}:F>", date.timestamp()),
            Err(_) => raw.to_string()
        },
        None => "Unknown".to_string()
    }
}

async fn announce(ctx: &Context, channel_id: ChannelId, game: &Game) -> Result<(), Error> {
    let description = game.description.clone()
        .filter(|description| !description.is_empty())
        .unwrap_or_else(|| "No description available".to_string());

    channel_id.send_message(&ctx.http, |m| m.embed(|e| {
        e.title(&game.title)
            .url(game.store_url())
            .description(description)
            .field("Available Until", format_until(game.available_until()), false);

        if let Some(image) = game.key_images.first() {
            e.thumbnail(&image.url);
        }

        e
    })).await?;

    Ok(())
}

async fn notify_guilds(ctx: &Context, db: &Database) -> Result<(), Error> {
    let games = fetch_games().await?;

    for guild_id in db.get_epic_guilds().await? {
        let mut settings = db.get_epic(guild_id).await?;

        let Some(channel_id) = settings.channel.map(ChannelId) else {
            continue;
        };

        if ctx.cache.guild_channel(channel_id).is_none() {
            warn!("Epic channel {} for guild {} is gone", channel_id, guild_id);
            continue;
        }

        let new_games = select_new_free_games(&games, &settings.posted_games);
        if new_games.is_empty() {
            continue;
        }

        for game in new_games {
            if let Err(ex) = announce(ctx, channel_id, game).await {
                error!("Failed to announce {} in guild {}: {}", game.title, guild_id, ex);
            }
            settings.posted_games.push(game.id.clone());
        }

        db.set_epic(guild_id, &settings).await?;
    }

    Ok(())
}

pub async fn check_free_games(ctx: Context) {
    let mut interval_hour = time::interval(Duration::from_secs(60 * 60));
    loop {
        interval_hour.tick().await;
        let db = db!(ctx);

        if let Err(ex) = notify_guilds(&ctx, &db).await {
            error!("Failed to check Epic free games: {}", ex);
        } else {
            info!("Checked Epic free games");
        }
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Set the channel for free game announcements.")
)]
pub async fn setepicchannel(
    ctx: HoradricContext<'_>,
    #[description = "Where to announce free games."] channel: GuildChannel)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    db.set_epic_channel(guild_id, Some(channel.id)).await?;

    ctx.say(format!("Channel set to <#{}>", channel.id)).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Remove the channel for free game announcements.")
)]
pub async fn removeepicchannel(ctx: HoradricContext<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    db.set_epic_channel(guild_id, None).await?;

    ctx.say("Channel for free game announcements has been removed.").await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Game> {
        let response: FreeGamesResponse = serde_json::from_str(r#"{
            "data": { "Catalog": { "searchStore": { "elements": [
                {
                    "id": "free-now",
                    "title": "Free Now",
                    "description": "A giveaway",
                    "productSlug": "free-now",
                    "keyImages": [{"type": "Thumbnail", "url": "https://cdn.example/free.png"}],
                    "expiryDate": null,
                    "promotions": { "promotionalOffers": [
                        { "promotionalOffers": [{ "startDate": "2024-01-01T16:00:00.000Z", "endDate": "2024-01-08T16:00:00.000Z" }] }
                    ], "upcomingPromotionalOffers": [] }
                },
                {
                    "id": "coming-soon",
                    "title": "Coming Soon",
                    "productSlug": null,
                    "urlSlug": "coming-soon",
                    "keyImages": [],
                    "promotions": { "promotionalOffers": [], "upcomingPromotionalOffers": [] }
                },
                {
                    "id": "no-promo",
                    "title": "Full Price",
                    "keyImages": [],
                    "promotions": null
                }
            ] } } }
        }"#).unwrap();

        response.data.catalog.search_store.elements
    }

    #[test]
    fn only_running_offers_are_free() {
        let games = catalog();
        let new_games = select_new_free_games(&games, &[]);

        assert_eq!(new_games.len(), 1);
        assert_eq!(new_games[0].id, "free-now");
    }

    #[test]
    fn posted_games_are_skipped() {
        let games = catalog();
        assert!(select_new_free_games(&games, &["free-now".to_string()]).is_empty());
    }

    #[test]
    fn store_url_falls_back_to_url_slug() {
        let games = catalog();
        assert_eq!(games[0].store_url(), "https://epicgames.com/store/product/free-now");
        assert_eq!(games[1].store_url(), "https://epicgames.com/store/product/coming-soon");
    }

    #[test]
    fn thumbnail_comes_from_first_key_image() {
        let games = catalog();
        assert_eq!(games[0].key_images.first().map(|image| image.url.as_str()), Some("https://cdn.example/free.png"));
        assert!(games[1].key_images.is_empty());
    }

    #[test]
    fn end_date_becomes_discord_timestamp() {
        let games = catalog();
        assert_eq!(format_until(games[0].available_until()), "<t:1704729600:F>");
        assert_eq!(format_until(None), "Unknown");
    }
}
