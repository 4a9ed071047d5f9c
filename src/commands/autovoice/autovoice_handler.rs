use serenity::{
    builder::CreateComponents,
    client::Context,
    model::{
        application::component::ButtonStyle,
        application::interaction::{
            message_component::MessageComponentInteraction,
            InteractionResponseType
        },
        channel::{ChannelType, PermissionOverwrite, PermissionOverwriteType},
        id::{ChannelId, GuildId, RoleId},
        permissions::Permissions,
        voice::VoiceState
    }
};
use dashmap::DashSet;
use tracing::{error, info, warn};

use crate::{Database, db, Error};
use super::{autovoice_lock, channel_name, created_channels, owned_voice_channel, NOT_IN_CREATED_CHANNEL};

pub const LOCK_BUTTON: &str = "autovoice_lock";
pub const UNLOCK_BUTTON: &str = "autovoice_unlock";

pub(crate) fn control_buttons(components: &mut CreateComponents) -> &mut CreateComponents {
    components.create_action_row(|row| row
        .create_button(|b| b
            .custom_id(LOCK_BUTTON)
            .label("Lock Channel")
            .style(ButtonStyle::Success))
        .create_button(|b| b
            .custom_id(UNLOCK_BUTTON)
            .label("Unlock Channel")
            .style(ButtonStyle::Danger))
    )
}

pub(crate) async fn send_control_message(ctx: &Context, db: &Database, guild_id: GuildId, channel_id: ChannelId) -> Result<(), Error> {
    let message = channel_id.send_message(&ctx.http, |m| m
        .embed(|e| e
            .title("Channel Management")
            .description("Use the buttons below to control your channel."))
        .components(control_buttons)
    ).await?;

    let lock = autovoice_lock(ctx).await;
    db.update_autovoice(&lock, guild_id, |settings| {
        settings.control_message_id.replace(message.id.0) != Some(message.id.0)
    }).await?;

    Ok(())
}

/// Denies or re-allows Connect for @everyone.
pub(crate) async fn set_locked(ctx: &Context, guild_id: GuildId, channel_id: ChannelId, locked: bool) -> Result<(), Error> {
    // The @everyone role shares the guild's id.
    let everyone = PermissionOverwriteType::Role(RoleId(guild_id.0));
    let overwrite = if locked {
        PermissionOverwrite { allow: Permissions::empty(), deny: Permissions::CONNECT, kind: everyone }
    } else {
        PermissionOverwrite { allow: Permissions::CONNECT, deny: Permissions::empty(), kind: everyone }
    };

    channel_id.create_permission(&ctx.http, &overwrite).await?;

    Ok(())
}

pub async fn restore(ctx: &Context) {
    let db = db!(ctx);
    let created = created_channels(ctx).await;

    let guilds = match db.get_autovoice_guilds().await {
        Ok(guilds) => guilds,
        Err(ex) => {
            error!("Failed to load autovoice guilds: {}", ex);
            return;
        }
    };

    for guild_id in guilds {
        let settings = match db.get_autovoice(guild_id).await {
            Ok(settings) => settings,
            Err(ex) => {
                error!("Failed to load autovoice settings for {}: {}", guild_id, ex);
                continue;
            }
        };

        for id in &settings.created_channels {
            created.insert(ChannelId(*id));
        }

        let Some(control_channel_id) = settings.control_channel_id.map(ChannelId) else {
            continue;
        };

        if ctx.cache.guild_channel(control_channel_id).is_none() {
            warn!("Control channel {} for guild {} is gone", control_channel_id, guild_id);
            continue;
        }

        let existing = match settings.control_message_id {
            Some(message_id) => control_channel_id.message(&ctx.http, message_id).await.ok(),
            None => None
        };

        let result = match existing {
            Some(mut message) => message.edit(ctx, |m| m.components(control_buttons)).await.map_err(Error::from),
            None => send_control_message(ctx, &db, guild_id, control_channel_id).await
        };

        if let Err(ex) = result {
            error!("Failed to restore control message for guild {}: {}", guild_id, ex);
        }
    }

    info!("Tracking {} created voice channels", created.len());
}

fn occupants(ctx: &Context, guild_id: GuildId, channel_id: ChannelId) -> usize {
    ctx.cache.guild(guild_id)
        .map(|guild| guild.voice_states.values().filter(|state| state.channel_id == Some(channel_id)).count())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VoiceAction {
    /// Make a personal channel next to this trigger and move the member in.
    Create(ChannelId),
    /// Delete a bot-created channel that just emptied.
    Remove(ChannelId)
}

/// What a voice state change asks of us. Joining and leaving are judged separately,
/// so hopping from a created channel straight into the trigger does both.
pub(crate) fn plan_voice_actions(
    old: Option<ChannelId>,
    new: Option<ChannelId>,
    trigger: Option<ChannelId>,
    created: &DashSet<ChannelId>,
    left_occupants: usize
) -> Vec<VoiceAction> {
    let mut actions = Vec::new();

    if let Some(joined) = new {
        if old != new && trigger == Some(joined) {
            actions.push(VoiceAction::Create(joined));
        }
    }

    if let Some(left) = old {
        if new != Some(left) && created.contains(&left) && left_occupants == 0 {
            actions.push(VoiceAction::Remove(left));
        }
    }

    actions
}

pub async fn voice_state_update(ctx: &Context, old: Option<&VoiceState>, new: &VoiceState) {
    let Some(guild_id) = new.guild_id else {
        return;
    };

    let db = db!(ctx);
    let created = created_channels(ctx).await;

    let old_channel = old.and_then(|state| state.channel_id);

    let trigger = match new.channel_id {
        Some(_) => match db.get_autovoice(guild_id).await {
            Ok(settings) => settings.trigger_channel_id.map(ChannelId),
            Err(ex) => {
                error!("Failed to load autovoice settings for {}: {}", guild_id, ex);
                None
            }
        },
        None => None
    };

    let left_occupants = old_channel.map(|left| occupants(ctx, guild_id, left)).unwrap_or(0);

    for action in plan_voice_actions(old_channel, new.channel_id, trigger, &created, left_occupants) {
        match action {
            VoiceAction::Create(trigger) => {
                if let Err(ex) = create_personal_channel(ctx, &db, guild_id, trigger, new).await {
                    error!("Failed to create personal voice channel: {}", ex);
                }
            }
            VoiceAction::Remove(left) => remove_empty_channel(ctx, &db, guild_id, left).await
        }
    }
}

async fn remove_empty_channel(ctx: &Context, db: &Database, guild_id: GuildId, channel_id: ChannelId) {
    if let Err(ex) = channel_id.delete(&ctx.http).await {
        error!("Failed to delete empty voice channel {}: {}", channel_id, ex);
        return;
    }

    created_channels(ctx).await.remove(&channel_id);

    let lock = autovoice_lock(ctx).await;
    if let Err(ex) = db.forget_created_channel(&lock, guild_id, channel_id).await {
        error!("Failed to forget voice channel {}: {}", channel_id, ex);
    }
}

async fn create_personal_channel(ctx: &Context, db: &Database, guild_id: GuildId, trigger: ChannelId, state: &VoiceState) -> Result<(), Error> {
    let category = ctx.cache.guild_channel(trigger).and_then(|channel| channel.parent_id);

    let display_name = match &state.member {
        Some(member) => member.display_name().to_string(),
        None => state.user_id.to_user(ctx).await?.name
    };

    let channel = guild_id.create_channel(&ctx.http, |c| {
        c.name(format!("{display_name}'s channel")).kind(ChannelType::Voice);
        if let Some(category) = category {
            c.category(category);
        }
        c
    }).await?;

    created_channels(ctx).await.insert(channel.id);

    let lock = autovoice_lock(ctx).await;
    db.track_created_channel(&lock, guild_id, channel.id).await?;

    guild_id.move_member(&ctx.http, state.user_id, channel.id).await?;

    Ok(())
}

pub async fn handle_button(ctx: &Context, component: &MessageComponentInteraction, locked: bool) -> Result<(), Error> {
    let owned = match component.guild_id {
        Some(guild_id) => owned_voice_channel(ctx, guild_id, component.user.id).await.map(|channel| (guild_id, channel)),
        None => None
    };

    let reply = match owned {
        Some((guild_id, channel_id)) => match set_locked(ctx, guild_id, channel_id, locked).await {
            Ok(()) => toggled_reply(&channel_name(ctx, channel_id), locked),
            Err(ex) => {
                error!("Failed to toggle lock on {}: {}", channel_id, ex);
                toggle_failed_reply(locked)
            }
        },
        None => NOT_IN_CREATED_CHANNEL.to_string()
    };

    component.create_interaction_response(&ctx.http, |r| r
        .kind(InteractionResponseType::ChannelMessageWithSource)
        .interaction_response_data(|d| d.content(reply).ephemeral(true))
    ).await?;

    Ok(())
}

pub(crate) fn toggled_reply(channel_name: &str, locked: bool) -> String {
    let state = if locked { "locked" } else { "unlocked" };
    format!("{channel_name} is now {state}.")
}

fn toggle_failed_reply(locked: bool) -> String {
    let action = if locked { "lock" } else { "unlock" };
    format!("I couldn't {action} your channel; maybe I lack permissions?")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIGGER: ChannelId = ChannelId(1);
    const PERSONAL: ChannelId = ChannelId(2);
    const OTHER: ChannelId = ChannelId(3);

    fn created() -> DashSet<ChannelId> {
        let set = DashSet::new();
        set.insert(PERSONAL);
        set
    }

    #[test]
    fn joining_trigger_creates_a_channel() {
        let actions = plan_voice_actions(None, Some(TRIGGER), Some(TRIGGER), &created(), 0);
        assert_eq!(actions, vec![VoiceAction::Create(TRIGGER)]);
    }

    #[test]
    fn joining_anything_else_does_nothing() {
        assert!(plan_voice_actions(None, Some(OTHER), Some(TRIGGER), &created(), 0).is_empty());
        assert!(plan_voice_actions(None, Some(TRIGGER), None, &created(), 0).is_empty());
    }

    #[test]
    fn leaving_created_channel_empty_removes_it() {
        let actions = plan_voice_actions(Some(PERSONAL), None, Some(TRIGGER), &created(), 0);
        assert_eq!(actions, vec![VoiceAction::Remove(PERSONAL)]);
    }

    #[test]
    fn occupied_or_foreign_channels_stay() {
        assert!(plan_voice_actions(Some(PERSONAL), None, Some(TRIGGER), &created(), 2).is_empty());
        assert!(plan_voice_actions(Some(OTHER), None, Some(TRIGGER), &created(), 0).is_empty());
    }

    #[test]
    fn hopping_into_trigger_does_both() {
        let actions = plan_voice_actions(Some(PERSONAL), Some(TRIGGER), Some(TRIGGER), &created(), 0);
        assert_eq!(actions, vec![VoiceAction::Create(TRIGGER), VoiceAction::Remove(PERSONAL)]);
    }

    #[test]
    fn mute_and_deafen_updates_are_ignored() {
        assert!(plan_voice_actions(Some(PERSONAL), Some(PERSONAL), Some(TRIGGER), &created(), 1).is_empty());
        assert!(plan_voice_actions(Some(TRIGGER), Some(TRIGGER), Some(TRIGGER), &created(), 1).is_empty());
    }

    #[test]
    fn button_replies_are_readable() {
        assert_eq!(toggled_reply("Cain's channel", true), "Cain's channel is now locked.");
        assert_eq!(toggle_failed_reply(false), "I couldn't unlock your channel; maybe I lack permissions?");
    }
}
