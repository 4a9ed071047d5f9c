mod tickets_db;
pub mod tickets_handler;

use std::sync::Arc;
use serenity::client::Context;
use serenity::model::channel::{ChannelType, GuildChannel, PermissionOverwrite, PermissionOverwriteType};
use serenity::model::guild::Role;
use serenity::model::id::RoleId;
use serenity::model::permissions::Permissions;
use serenity::prelude::TypeMapKey;
use tokio::sync::Mutex;
use tracing::error;

use crate::{HoradricContext, Database, db, horadricdb, Error};
use crate::commands::group_help;

const ORANGE: u32 = 0xE67E22;
const MAX_CATEGORY_LENGTH: usize = 80;

/// Held while a ticket number is handed out.
pub struct TicketLock;

impl TypeMapKey for TicketLock {
    type Value = Arc<Mutex<()>>;
}

pub(crate) async fn ticket_lock(ctx: &Context) -> Arc<Mutex<()>> {
    let data = ctx.data.read().await;
    data.get::<TicketLock>().expect("Couldn't find ticket lock").clone()
}

#[poise::command(prefix_command, slash_command,
    subcommands("setup", "transcript", "addcategory", "removecategory", "role", "channel", "logchannel"),
    discard_spare_arguments,
    description_localized("en-US", "Simple Tickets commands."),
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    identifying_name = "Simple Tickets"
)]
pub async fn stickets(ctx: HoradricContext<'_>) -> Result<(), Error> {
    group_help(ctx).await
}

/// Keeps the panel in step with the settings; a failure here should not fail the command.
async fn refresh_panel(ctx: HoradricContext<'_>) {
    let Some(guild_id) = ctx.guild_id() else {
        return;
    };

    let sctx = ctx.serenity_context();
    let db = db!(sctx);

    if let Err(ex) = tickets_handler::update_panel(sctx, &db, guild_id).await {
        error!("Failed to update ticket panel for guild {}: {}", guild_id, ex);
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    description_localized("en-US", "Setup guide for the ticket system.")
)]
pub async fn setup(ctx: HoradricContext<'_>) -> Result<(), Error> {
    let prefix = ctx.prefix().to_string();

    ctx.send(|m| m.embed(|e| e
        .title("Ticket System Setup Guide")
        .description("Follow the steps below to set up the ticket system.")
        .colour(ORANGE)
        .field("Step 1: Create a Ticket Channel",
            format!("Create a new text channel where users can create tickets. Use the `{prefix}stickets channel` command to set this channel."), false)
        .field("Step 2: Set Log Channel (Optional)",
            format!("Set a log channel to log ticket creations. Use the `{prefix}stickets logchannel` command to set this channel."), false)
        .field("Step 3: Add Ticket Categories",
            format!("Add ticket categories using the `{prefix}stickets addcategory` command. Users can create tickets in these categories."), false)
        .field("Step 4: Add Ticket Roles",
            format!("Add roles that can access the ticket system using the `{prefix}stickets role` command."), false)
        .field("Step 5: Toggle DM on Close and Transcript Generation",
            format!("Toggle DM on close and transcript generation using the `{prefix}stickets transcript <true/false> <true/false>` command."), false)
    )).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    description_localized("en-US", "Toggle DM on close and transcript generation.")
)]
pub async fn transcript(
    ctx: HoradricContext<'_>,
    #[description = "DM the transcript to whoever closes the ticket."] dm_on_close: bool,
    #[description = "Generate transcripts when tickets close."] transcript_enabled: bool)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    let mut settings = db.get_tickets(guild_id).await?;
    settings.dm_on_close = dm_on_close;
    settings.transcript_enabled = transcript_enabled;
    db.set_tickets(guild_id, &settings).await?;

    ctx.say(format!("DM on close set to {dm_on_close}. Transcript generation set to {transcript_enabled}.")).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    description_localized("en-US", "Add a category to the ticket system.")
)]
pub async fn addcategory(
    ctx: HoradricContext<'_>,
    #[description = "The category's name."] #[rest] category_name: String)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let category_name = category_name.trim();
    if category_name.is_empty() || category_name.chars().count() > MAX_CATEGORY_LENGTH {
        ctx.say(format!("Category names must be between 1 and {MAX_CATEGORY_LENGTH} characters.")).await?;
        return Ok(());
    }

    let db = horadricdb!(ctx);
    let mut settings = db.get_tickets(guild_id).await?;

    if !settings.add_category(category_name) {
        ctx.say(format!("Category '{category_name}' already exists.")).await?;
        return Ok(());
    }

    db.set_tickets(guild_id, &settings).await?;
    refresh_panel(ctx).await;

    ctx.say(format!("Category '{category_name}' added to the ticket system.")).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    description_localized("en-US", "Remove a category from the ticket system.")
)]
pub async fn removecategory(
    ctx: HoradricContext<'_>,
    #[description = "The category's name."] #[rest] category_name: String)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let category_name = category_name.trim();
    let db = horadricdb!(ctx);
    let mut settings = db.get_tickets(guild_id).await?;

    if !settings.remove_category(category_name) {
        ctx.say(format!("Category '{category_name}' does not exist.")).await?;
        return Ok(());
    }

    db.set_tickets(guild_id, &settings).await?;
    refresh_panel(ctx).await;

    ctx.say(format!("Category '{category_name}' removed from the ticket system.")).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    description_localized("en-US", "Add roles to the ticket system.")
)]
pub async fn role(
    ctx: HoradricContext<'_>,
    #[description = "The roles that handle tickets."] roles: Vec<Role>)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    if roles.is_empty() {
        ctx.say("You need to provide at least one role.").await?;
        return Ok(());
    }

    let db = horadricdb!(ctx);
    let mut settings = db.get_tickets(guild_id).await?;
    settings.add_roles(roles.iter().map(|role| role.id.0));
    db.set_tickets(guild_id, &settings).await?;

    let mentions = roles.iter()
        .map(|role| format!("<@&{}>", role.id))
        .collect::<Vec<_>>()
        .join(" ");

    ctx.say(format!("Roles {mentions} added to ticket access.")).await?;

    Ok(())
}

/// Hides the channel from @everyone and opens it to the ticket roles.
fn ticket_channel_overwrites(everyone: RoleId, ticket_roles: &[RoleId]) -> Vec<PermissionOverwrite> {
    let mut overwrites = vec![PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::VIEW_CHANNEL,
        kind: PermissionOverwriteType::Role(everyone)
    }];

    overwrites.extend(ticket_roles.iter().map(|role| PermissionOverwrite {
        allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::MANAGE_THREADS,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Role(*role)
    }));

    overwrites
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    description_localized("en-US", "Set up the ticket system in a channel.")
)]
pub async fn channel(
    ctx: HoradricContext<'_>,
    #[description = "The channel that holds the ticket panel."] channel: GuildChannel)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    if channel.kind != ChannelType::Text {
        ctx.say("The ticket channel must be a text channel.").await?;
        return Ok(());
    }

    let sctx = ctx.serenity_context();
    let db = horadricdb!(ctx);
    let mut settings = db.get_tickets(guild_id).await?;
    settings.ticket_channel_id = Some(channel.id.0);
    db.set_tickets(guild_id, &settings).await?;

    let ticket_roles: Vec<RoleId> = settings.ticket_roles.iter()
        .map(|id| RoleId(*id))
        .filter(|role| sctx.cache.role(guild_id, *role).is_some())
        .collect();

    if settings.ticket_roles.is_empty() {
        ctx.say(format!("Ticket system set up in <#{}>.", channel.id)).await?;
    } else {
        // The @everyone role shares the guild's id.
        let overwrites = ticket_channel_overwrites(RoleId(guild_id.0), &ticket_roles);

        match channel.id.edit(&sctx.http, |c| c.permissions(overwrites)).await {
            Ok(_) => {
                ctx.say(format!("Ticket system set up in <#{}> with role-based access and Manage Threads permission.", channel.id)).await?;
            }
            Err(ex) => {
                error!("Failed to lock ticket channel {}: {}", channel.id, ex);
                ctx.say(format!("An error occurred: {ex}")).await?;
            }
        }
    }

    refresh_panel(ctx).await;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS",
    description_localized("en-US", "Set up the ticket log channel.")
)]
pub async fn logchannel(
    ctx: HoradricContext<'_>,
    #[description = "Where ticket activity is logged."] channel: GuildChannel)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    let mut settings = db.get_tickets(guild_id).await?;
    settings.log_channel_id = Some(channel.id.0);
    db.set_tickets(guild_id, &settings).await?;

    ctx.say(format!("Ticket log channel set to <#{}>", channel.id)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everyone_is_denied_first() {
        let overwrites = ticket_channel_overwrites(RoleId(1), &[RoleId(2), RoleId(3)]);

        assert_eq!(overwrites.len(), 3);
        assert_eq!(overwrites[0].kind, PermissionOverwriteType::Role(RoleId(1)));
        assert_eq!(overwrites[0].deny, Permissions::VIEW_CHANNEL);
        assert!(overwrites[1].allow.contains(Permissions::MANAGE_THREADS));
        assert!(overwrites[2].allow.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn no_roles_only_hides_channel() {
        assert_eq!(ticket_channel_overwrites(RoleId(1), &[]).len(), 1);
    }
}
