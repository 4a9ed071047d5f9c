use serenity::model::guild::Member;
use serenity::model::id::ChannelId;

use crate::{HoradricContext, Error};
use crate::commands::group_help;
use super::{channel_name, owned_voice_channel, user_voice_channel, NOT_IN_CREATED_CHANNEL};
use super::autovoice_handler::{set_locked, toggled_reply};

#[poise::command(prefix_command, slash_command,
    subcommands("lock", "unlock", "kick", "limit"),
    discard_spare_arguments,
    description_localized("en-US", "Control your own personal voice channel."),
    aliases("av"),
    guild_only,
    identifying_name = "Auto Voice"
)]
pub async fn autovoice(ctx: HoradricContext<'_>) -> Result<(), Error> {
    group_help(ctx).await
}

async fn toggle_lock(ctx: HoradricContext<'_>, locked: bool) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be run in a server.").await?;
        return Ok(());
    };

    let sctx = ctx.serenity_context();

    match owned_voice_channel(sctx, guild_id, ctx.author().id).await {
        Some(channel_id) => {
            set_locked(sctx, guild_id, channel_id, locked).await?;
            ctx.say(toggled_reply(&channel_name(sctx, channel_id), locked)).await?;
        }
        None => {
            ctx.send(|m| m.content(NOT_IN_CREATED_CHANNEL).ephemeral(true)).await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Lock your personal voice channel.")
)]
pub async fn lock(ctx: HoradricContext<'_>) -> Result<(), Error> {
    toggle_lock(ctx, true).await
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Unlock your personal voice channel.")
)]
pub async fn unlock(ctx: HoradricContext<'_>) -> Result<(), Error> {
    toggle_lock(ctx, false).await
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Kick a user from your personal voice channel.")
)]
pub async fn kick(
    ctx: HoradricContext<'_>,
    #[description = "The member to remove from your channel."] member: Member)
-> Result<(), Error> {
    let sctx = ctx.serenity_context();

    let owned = owned_voice_channel(sctx, member.guild_id, ctx.author().id).await;
    let target = user_voice_channel(sctx, member.guild_id, member.user.id);

    match kick_from(owned, target) {
        Some(channel_id) => {
            member.guild_id.disconnect_member(&sctx.http, member.user.id).await?;
            ctx.say(format!("{} has been kicked from {}.", member.display_name(), channel_name(sctx, channel_id))).await?;
        }
        None => {
            ctx.say(not_in_channel(&member.display_name())).await?;
        }
    }

    Ok(())
}

/// The author's created channel, if the target is sitting in it.
fn kick_from(owned: Option<ChannelId>, target: Option<ChannelId>) -> Option<ChannelId> {
    owned.filter(|channel| target == Some(*channel))
}

fn not_in_channel(name: &str) -> String {
    format!("{name} is not in your channel.")
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Set a user limit on your personal voice channel.")
)]
pub async fn limit(
    ctx: HoradricContext<'_>,
    #[description = "Maximum number of users, 0 for no limit."] #[min = 0] #[max = 99] limit: u64)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be run in a server.").await?;
        return Ok(());
    };

    if limit > 99 {
        ctx.say("The limit has to be between 0 and 99.").await?;
        return Ok(());
    }

    let sctx = ctx.serenity_context();

    match owned_voice_channel(sctx, guild_id, ctx.author().id).await {
        Some(channel_id) => {
            channel_id.edit(&sctx.http, |c| c.user_limit(limit)).await?;
            ctx.say(format!("{} now has a limit of {} users.", channel_name(sctx, channel_id), limit)).await?;
        }
        None => {
            ctx.send(|m| m.content(NOT_IN_CREATED_CHANNEL).ephemeral(true)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kicks_only_from_the_authors_channel() {
        assert_eq!(kick_from(Some(ChannelId(5)), Some(ChannelId(5))), Some(ChannelId(5)));
        assert_eq!(kick_from(Some(ChannelId(5)), Some(ChannelId(6))), None);
        assert_eq!(kick_from(Some(ChannelId(5)), None), None);
    }

    #[test]
    fn author_outside_a_created_channel_gets_the_member_reply() {
        assert_eq!(kick_from(None, Some(ChannelId(5))), None);
        assert_eq!(not_in_channel("Tyrael"), "Tyrael is not in your channel.");
    }
}
