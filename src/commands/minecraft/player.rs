use reqwest::Client;
use tracing::error;

use crate::{HoradricContext, Error};
use super::mojang::{crafthead_url, lookup_profile, namemc_url, Profile};

const BLURPLE: u32 = 0x5865F2;

#[derive(Clone, Copy)]
enum Lookup {
    Player,
    Cape,
    Skin
}

async fn resolve(ctx: HoradricContext<'_>, player: &str) -> Result<Option<Profile>, Error> {
    ctx.defer().await?;

    match lookup_profile(&Client::new(), player).await {
        Ok(Some(profile)) => Ok(Some(profile)),
        Ok(None) => {
            ctx.send(|m| m.content(format!("Player '{player}' not found.")).ephemeral(true)).await?;
            Ok(None)
        }
        Err(ex) => {
            error!("Failed to look up Minecraft player {}: {}", player, ex);
            ctx.send(|m| m.content(format!("An error occurred: {ex}")).ephemeral(true)).await?;
            Ok(None)
        }
    }
}

async fn show(ctx: HoradricContext<'_>, player: String, lookup: Lookup) -> Result<(), Error> {
    let Some(profile) = resolve(ctx, &player).await? else {
        return Ok(());
    };

    let uuid = profile.id;

    ctx.send(|m| m.embed(|e| {
        e.title(format!("Player: {}", profile.name))
            .url(namemc_url(&uuid))
            .colour(BLURPLE);

        match lookup {
            Lookup::Player => {
                e.description(format!("You have looked up {}!", profile.name))
                    .thumbnail(crafthead_url("avatar", &uuid))
                    .image(crafthead_url("body", &uuid))
                    .field("UUID", format!("```{uuid}```"), true);
            }
            Lookup::Cape => {
                e.description(format!("You have looked up {}'s cape!", profile.name))
                    .image(crafthead_url("cape", &uuid));
            }
            Lookup::Skin => {
                e.description(format!("You have looked up {}'s skin!", profile.name))
                    .image(crafthead_url("skin", &uuid));
            }
        }

        e
    })).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Look up a Minecraft player by name."),
    discard_spare_arguments
)]
pub async fn player(
    ctx: HoradricContext<'_>,
    #[description = "The player's name."] player: String)
-> Result<(), Error> {
    show(ctx, player, Lookup::Player).await
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Look up a Minecraft player's cape by name."),
    discard_spare_arguments
)]
pub async fn cape(
    ctx: HoradricContext<'_>,
    #[description = "The player's name."] player: String)
-> Result<(), Error> {
    show(ctx, player, Lookup::Cape).await
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Look up a Minecraft player's skin by name."),
    discard_spare_arguments
)]
pub async fn skin(
    ctx: HoradricContext<'_>,
    #[description = "The player's name."] player: String)
-> Result<(), Error> {
    show(ctx, player, Lookup::Skin).await
}
