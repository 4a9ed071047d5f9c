use serenity::model::channel::GuildChannel;
use tracing::error;

use crate::{HoradricContext, Error};

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Clones permissions from one channel to another.")
)]
pub async fn cloneperms(
    ctx: HoradricContext<'_>,
    #[description = "The channel to copy permissions from."] source: GuildChannel,
    #[description = "The channel to copy permissions to."] destination: GuildChannel)
-> Result<(), Error> {
    let overwrites = source.permission_overwrites.clone();

    match destination.id.edit(&ctx.serenity_context().http, |c| c.permissions(overwrites)).await {
        Ok(_) => {
            ctx.say(format!("Permissions from <#{}> have been cloned to <#{}>.", source.id, destination.id)).await?;
        }
        Err(ex) => {
            error!("Failed to clone permissions from {} to {}: {}", source.id, destination.id, ex);
            ctx.say(format!("An error occurred: {ex}")).await?;
        }
    }

    Ok(())
}
