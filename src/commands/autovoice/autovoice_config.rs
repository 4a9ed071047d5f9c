use serenity::model::channel::{ChannelType, GuildChannel};
use tracing::error;

use crate::{HoradricContext, Database, db, horadricdb, Error};
use crate::commands::group_help;
use super::autovoice_lock;
use super::autovoice_handler::send_control_message;

#[poise::command(prefix_command, slash_command,
    subcommands("trigger", "control"),
    discard_spare_arguments,
    description_localized("en-US", "Commands for setting up personal voice channels."),
    aliases("avs"),
    guild_only,
    required_permissions = "ADMINISTRATOR",
    identifying_name = "Auto Voice Settings"
)]
pub async fn autovoiceset(ctx: HoradricContext<'_>) -> Result<(), Error> {
    group_help(ctx).await
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Set the voice channel that triggers a new voice channel to be created.")
)]
pub async fn trigger(
    ctx: HoradricContext<'_>,
    #[description = "The voice channel members join to get their own channel."] channel: GuildChannel)
-> Result<(), Error> {
    let db = horadricdb!(ctx);

    if channel.kind != ChannelType::Voice {
        ctx.say("The trigger has to be a voice channel.").await?;
        return Ok(());
    }

    let lock = autovoice_lock(ctx.serenity_context()).await;

    match db.update_autovoice(&lock, channel.guild_id, |settings| {
        settings.trigger_channel_id.replace(channel.id.0) != Some(channel.id.0)
    }).await {
        Ok(_) => {
            ctx.say(format!("Trigger channel set to {}.", channel.name)).await?;
        }
        Err(ex) => {
            error!("Failed to load autovoice settings: {}", ex);
            ctx.say("We couldn't get the autovoice settings... try again later?").await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Set the control channel where the control buttons will be displayed.")
)]
pub async fn control(
    ctx: HoradricContext<'_>,
    #[description = "The text channel for the lock and unlock buttons."] channel: GuildChannel)
-> Result<(), Error> {
    let db = horadricdb!(ctx);

    if channel.kind != ChannelType::Text {
        ctx.say("The control channel has to be a text channel.").await?;
        return Ok(());
    }

    let lock = autovoice_lock(ctx.serenity_context()).await;

    let updated = db.update_autovoice(&lock, channel.guild_id, |settings| {
        settings.control_channel_id.replace(channel.id.0) != Some(channel.id.0)
    }).await;

    if let Err(ex) = updated {
        error!("Failed to save autovoice settings: {}", ex);
        ctx.say("We couldn't get the autovoice settings... try again later?").await?;
        return Ok(());
    }

    ctx.say(format!("Control channel set to {}.", channel.name)).await?;

    if let Err(ex) = send_control_message(ctx.serenity_context(), &db, channel.guild_id, channel.id).await {
        error!("Failed to send control message: {}", ex);
        ctx.say("I couldn't post the control buttons there; maybe I lack permissions?").await?;
    }

    Ok(())
}
