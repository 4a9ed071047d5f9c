mod gaia_db;

use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::error;

use crate::{HoradricContext, Database, db, horadricdb, Error, USER_AGENT};
use crate::commands::group_help;

const BLUE: u32 = 0x3498DB;

#[poise::command(prefix_command, slash_command,
    subcommands("ava", "save", "me", "wipe"),
    discard_spare_arguments,
    description_localized("en-US", "Commands related to Gaia Online."),
    aliases("go"),
    guild_only,
    identifying_name = "Gaia Online"
)]
pub async fn gaia(ctx: HoradricContext<'_>) -> Result<(), Error> {
    group_help(ctx).await
}

fn profile_url(username: &str) -> Result<Url, Error> {
    let mut url = Url::parse("https://www.gaiaonline.com/profiles/")?;
    url.path_segments_mut()
        .map_err(|_| "Gaia profile URL cannot take a path")?
        .pop_if_empty()
        .push(username);

    Ok(url)
}

/// Finds the avatar image on a profile page; its alt text is the username or "<username>'s avatar".
fn find_avatar(page: &str, username: &str) -> Option<String> {
    let document = Html::parse_document(page);
    let images = Selector::parse("img[alt]").ok()?;

    let expected_exact = username.to_lowercase();
    let expected_avatar = format!("{expected_exact}'s avatar");

    document.select(&images)
        .find(|img| {
            let alt = img.value().attr("alt").unwrap_or_default().to_lowercase();
            alt == expected_exact || alt == expected_avatar
        })
        .and_then(|img| img.value().attr("src"))
        .map(|src| src.to_string())
}

async fn show_avatar(ctx: HoradricContext<'_>, username: &str) -> Result<(), Error> {
    let url = profile_url(username)?;

    let response = match Client::new().get(url.clone()).header("User-Agent", USER_AGENT).send().await {
        Ok(response) => response,
        Err(ex) => {
            error!("Failed to reach Gaia Online: {}", ex);
            ctx.say("Failed to reach Gaia Online, try again later?").await?;
            return Ok(());
        }
    };

    let status = response.status();
    if !status.is_success() {
        ctx.say(format!("Error: Unable to retrieve avatar. HTTP Status: {}", status.as_u16())).await?;
        return Ok(());
    }

    let page = match response.text().await {
        Ok(page) => page,
        Err(ex) => {
            error!("Failed to read Gaia profile page: {}", ex);
            ctx.say(format!("Error parsing HTML: {ex}")).await?;
            return Ok(());
        }
    };

    match find_avatar(&page, username) {
        Some(avatar) => {
            ctx.send(|m| m.embed(|e| e
                .title(format!("{username}'s Avatar"))
                .url(url)
                .colour(BLUE)
                .image(avatar)
            )).await?;
        }
        None => {
            ctx.say(format!("No avatar found for \"{username}\".")).await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Search up an avatar on Gaia Online.")
)]
pub async fn ava(
    ctx: HoradricContext<'_>,
    #[description = "The Gaia Online username."] #[rest] username: String)
-> Result<(), Error> {
    ctx.defer().await?;
    show_avatar(ctx, username.trim()).await
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Save your Gaia Online username.")
)]
pub async fn save(
    ctx: HoradricContext<'_>,
    #[description = "The Gaia Online username."] #[rest] username: String)
-> Result<(), Error> {
    let db = horadricdb!(ctx);
    let username = username.trim();

    match db.set_gaia_username(ctx.author().id, username).await {
        Ok(_) => { ctx.say(format!("Gaia Online username saved as: {username}")).await?; }
        Err(ex) => {
            error!("Failed to save Gaia username: {}", ex);
            ctx.say("Could not save your username, try again later?").await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Display your saved Gaia Online avatar.")
)]
pub async fn me(ctx: HoradricContext<'_>) -> Result<(), Error> {
    let db = horadricdb!(ctx);

    match db.get_gaia_username(ctx.author().id).await? {
        Some(username) => {
            ctx.defer().await?;
            show_avatar(ctx, &username).await
        }
        None => {
            ctx.say(format!("You haven't set a username yet. Use `{}go save [username]` to save it.", ctx.prefix())).await?;
            Ok(())
        }
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Delete your saved Gaia Online username.")
)]
pub async fn wipe(ctx: HoradricContext<'_>) -> Result<(), Error> {
    let db = horadricdb!(ctx);

    match db.clear_gaia_username(ctx.author().id).await {
        Ok(_) => { ctx.say("Your avatar has been delete from the database.").await?; }
        Err(ex) => {
            error!("Failed to wipe user data: {}", ex);
            ctx.say("Could not delete your data, try again later?").await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <img src="/images/logo.png" alt="Gaia Online">
            <img src="/images/banner.png">
            <div id="avatar"><img src="https://a1cdn.gaiaonline.com/dress-up/avatar/ava/12/34/abc_flip.png" alt="CoolUser's avatar"></div>
        </body></html>
    "#;

    #[test]
    fn avatar_is_found_by_alt_text() {
        assert_eq!(
            find_avatar(PAGE, "cooluser").as_deref(),
            Some("https://a1cdn.gaiaonline.com/dress-up/avatar/ava/12/34/abc_flip.png")
        );
    }

    #[test]
    fn exact_username_alt_matches_too() {
        let page = r#"<img src="a.png" alt="Someone">"#;
        assert_eq!(find_avatar(page, "someone").as_deref(), Some("a.png"));
    }

    #[test]
    fn missing_avatar_is_none() {
        assert_eq!(find_avatar(PAGE, "nobody"), None);
    }

    #[test]
    fn usernames_are_escaped_in_urls() {
        assert_eq!(profile_url("Cool User").unwrap().as_str(), "https://www.gaiaonline.com/profiles/Cool%20User");
    }
}
