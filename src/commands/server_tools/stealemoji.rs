use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{error, warn};

use crate::{HoradricContext, Error, USER_AGENT};

const MAX_EMOJIS: usize = 10;

static CUSTOM_EMOJI: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(a?):(\w+):(\d+)>").expect("emoji pattern is valid"));

#[derive(Debug, PartialEq, Eq)]
struct CustomEmoji {
    animated: bool,
    name: String,
    id: u64
}

impl CustomEmoji {
    fn extension(&self) -> &'static str {
        if self.animated { "gif" } else { "png" }
    }

    fn cdn_url(&self) -> String {
        format!("https://cdn.discordapp.com/emojis/{}.{}", self.id, self.extension())
    }

    fn data_uri(&self, image: &[u8]) -> String {
        format!("data:image/{};base64,{}", self.extension(), STANDARD.encode(image))
    }
}

fn parse_custom_emojis(message: &str) -> Vec<CustomEmoji> {
    CUSTOM_EMOJI.captures_iter(message)
        .filter_map(|cap| Some(CustomEmoji {
            animated: !cap[1].is_empty(),
            name: cap[2].to_string(),
            id: cap[3].parse().ok()?
        }))
        .collect()
}

fn summarize(uploaded: &[String], failed: &[String]) -> String {
    let mut response = String::new();

    if !uploaded.is_empty() {
        response += &format!("Uploaded: {}\n", uploaded.join(", "));
    }
    if !failed.is_empty() {
        response += &format!("Failed to upload: {}", failed.join(", "));
    }
    if response.is_empty() {
        response = "I couldn't find any custom emojis in that message.".to_string();
    }

    response
}

/// Upload an emoji from another server to your own.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Upload emojis from another server to this one.")
)]
pub async fn stealemoji(
    ctx: HoradricContext<'_>,
    #[description = "One or more custom emojis."] #[rest] message: String)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be run in a server.").await?;
        return Ok(());
    };

    let emojis = parse_custom_emojis(&message);
    if emojis.len() > MAX_EMOJIS {
        ctx.say(format!("You can only upload up to {MAX_EMOJIS} emojis at a time.")).await?;
        return Ok(());
    }

    ctx.defer().await?;

    let client = Client::new();
    let http = &ctx.serenity_context().http;
    let mut uploaded = Vec::new();
    let mut failed = Vec::new();

    for emoji in emojis {
        let image = match client.get(emoji.cdn_url()).header("User-Agent", USER_AGENT).send().await {
            Ok(response) if response.status().is_success() => response.bytes().await,
            Ok(response) => {
                warn!("Emoji {} download returned {}", emoji.id, response.status());
                failed.push(emoji.name);
                continue;
            }
            Err(ex) => Err(ex)
        };

        let image = match image {
            Ok(image) => image,
            Err(ex) => {
                error!("Failed to download emoji {}: {}", emoji.id, ex);
                failed.push(emoji.name);
                continue;
            }
        };

        match guild_id.create_emoji(http, &emoji.name, &emoji.data_uri(&image)).await {
            Ok(_) => uploaded.push(emoji.name),
            Err(ex) => {
                error!("Failed to upload emoji {}: {}", emoji.name, ex);
                failed.push(emoji.name);
            }
        }
    }

    ctx.say(summarize(&uploaded, &failed)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_static_and_animated_emojis() {
        let emojis = parse_custom_emojis("look <:pepe:123> and <a:party_blob:456789> but not :smile:");

        assert_eq!(emojis, vec![
            CustomEmoji { animated: false, name: "pepe".to_string(), id: 123 },
            CustomEmoji { animated: true, name: "party_blob".to_string(), id: 456789 }
        ]);
        assert_eq!(emojis[0].cdn_url(), "https://cdn.discordapp.com/emojis/123.png");
        assert_eq!(emojis[1].cdn_url(), "https://cdn.discordapp.com/emojis/456789.gif");
    }

    #[test]
    fn data_uri_matches_format() {
        let emoji = CustomEmoji { animated: false, name: "x".to_string(), id: 1 };
        assert_eq!(emoji.data_uri(b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn summary_lists_both_outcomes() {
        let uploaded = vec!["a".to_string(), "b".to_string()];
        let failed = vec!["c".to_string()];

        assert_eq!(summarize(&uploaded, &failed), "Uploaded: a, b\nFailed to upload: c");
        assert_eq!(summarize(&uploaded, &[]), "Uploaded: a, b\n");
        assert_eq!(summarize(&[], &[]), "I couldn't find any custom emojis in that message.");
    }
}
