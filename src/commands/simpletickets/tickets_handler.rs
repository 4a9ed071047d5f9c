use std::borrow::Cow;
use chrono::{TimeZone, Utc};
use serenity::{
    builder::CreateComponents,
    client::Context,
    model::{
        application::component::ButtonStyle,
        application::interaction::{
            message_component::MessageComponentInteraction,
            InteractionResponseType
        },
        channel::{AttachmentType, Channel, GuildChannel, Message},
        id::{ChannelId, GuildId, MessageId, RoleId}
    }
};
use tracing::{error, info, warn};

use crate::{Database, db, Error};
use crate::services::database::locked;
use super::ticket_lock;
use super::tickets_db::TicketSettings;

pub const CREATE_PREFIX: &str = "create_ticket_";
pub const CLOSE_PREFIX: &str = "close_ticket_";

const GREEN: u32 = 0x2ECC71;
const RED: u32 = 0xE74C3C;
const ARCHIVE_AFTER_MINUTES: u16 = 4320;
const BUTTONS_PER_ROW: usize = 5;
const MAX_BUTTONS: usize = 25;
const MAX_THREAD_NAME: usize = 100;
const HISTORY_PAGE: u64 = 100;

/// A ticket button, decoded from its custom id.
#[derive(Debug, PartialEq, Eq)]
pub enum TicketButton<'a> {
    Create(&'a str),
    Close(ChannelId)
}

pub fn parse_button(custom_id: &str) -> Option<TicketButton<'_>> {
    if let Some(category) = custom_id.strip_prefix(CREATE_PREFIX) {
        return Some(TicketButton::Create(category));
    }

    custom_id.strip_prefix(CLOSE_PREFIX)
        .and_then(|id| id.parse::<u64>().ok())
        .map(|id| TicketButton::Close(ChannelId(id)))
}

fn thread_name(counter: u64, display_name: &str) -> String {
    format!("ticket-{counter}-{display_name}")
        .chars()
        .take(MAX_THREAD_NAME)
        .collect()
}

fn jump_url(guild_id: GuildId, channel_id: ChannelId) -> String {
    format!("https://discord.com/channels/{guild_id}/{channel_id}")
}

fn transcript_line(author: &str, unix_time: i64, content: &str) -> String {
    let time = Utc.timestamp_opt(unix_time, 0)
        .single()
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| unix_time.to_string());

    format!("{author} [{time}]: {content}\n")
}

/// Messages come back newest first; transcripts read oldest first.
fn build_transcript(newest_first: &[Message]) -> String {
    newest_first.iter()
        .rev()
        .map(|message| transcript_line(&message.author.name, message.timestamp.unix_timestamp(), &message.content))
        .collect()
}

fn panel_buttons<'a>(components: &'a mut CreateComponents, categories: &[String]) -> &'a mut CreateComponents {
    for row in categories.iter().take(MAX_BUTTONS).collect::<Vec<_>>().chunks(BUTTONS_PER_ROW) {
        components.create_action_row(|r| {
            for category in row {
                r.create_button(|b| b
                    .custom_id(format!("{CREATE_PREFIX}{category}"))
                    .label(*category)
                    .style(ButtonStyle::Success));
            }
            r
        });
    }

    components
}

/// Posts the ticket panel, or refreshes it in place if it still exists.
pub async fn update_panel(ctx: &Context, db: &Database, guild_id: GuildId) -> Result<(), Error> {
    let mut settings = db.get_tickets(guild_id).await?;

    let Some(channel_id) = settings.ticket_channel_id.map(ChannelId) else {
        return Ok(());
    };

    if ctx.cache.guild_channel(channel_id).is_none() {
        warn!("Ticket channel {} for guild {} is gone", channel_id, guild_id);
        return Ok(());
    }

    let categories = settings.categories.clone();

    if let Some(message_id) = settings.message_id {
        if let Ok(mut message) = channel_id.message(&ctx.http, message_id).await {
            message.edit(ctx, |m| m
                .embed(|e| e
                    .title("Support Tickets")
                    .description("Click a button below to create a new ticket in a specific category."))
                .components(|c| panel_buttons(c, &categories))
            ).await?;
            return Ok(());
        }
    }

    let message = channel_id.send_message(&ctx.http, |m| m
        .embed(|e| e
            .title("Support Tickets")
            .description("Click a button below to create a new ticket in a specific category."))
        .components(|c| panel_buttons(c, &categories))
    ).await?;

    settings.message_id = Some(message.id.0);
    db.set_tickets(guild_id, &settings).await?;

    Ok(())
}

pub async fn restore(ctx: &Context) {
    let db = db!(ctx);

    let guilds = match db.get_ticket_guilds().await {
        Ok(guilds) => guilds,
        Err(ex) => {
            error!("Failed to load ticket guilds: {}", ex);
            return;
        }
    };

    for guild_id in &guilds {
        if let Err(ex) = update_panel(ctx, &db, *guild_id).await {
            error!("Failed to restore ticket panel for guild {}: {}", guild_id, ex);
        }
    }

    info!("Restored ticket panels for {} guilds", guilds.len());
}

pub async fn handle_button(ctx: &Context, component: &MessageComponentInteraction, button: TicketButton<'_>) -> Result<(), Error> {
    match button {
        TicketButton::Create(category) => create_ticket(ctx, component, category).await,
        TicketButton::Close(thread_id) => close_ticket(ctx, component, thread_id).await
    }
}

async fn reply_ephemeral(ctx: &Context, component: &MessageComponentInteraction, content: &str) -> Result<(), Error> {
    component.create_interaction_response(&ctx.http, |r| r
        .kind(InteractionResponseType::ChannelMessageWithSource)
        .interaction_response_data(|d| d.content(content).ephemeral(true))
    ).await?;

    Ok(())
}

/// Reserves a ticket number; the lock keeps two clicks from sharing one.
async fn reserve_ticket(ctx: &Context, db: &Database, guild_id: GuildId) -> Result<(TicketSettings, u64), Error> {
    let lock = ticket_lock(ctx).await;

    locked(&lock, async {
        let mut settings = db.get_tickets(guild_id).await?;
        let number = settings.next_ticket();
        db.set_tickets(guild_id, &settings).await?;

        Ok((settings, number))
    }).await
}

fn failure_reply(action: &str, ex: &Error) -> String {
    format!("Something went wrong while {action} the ticket: {ex}")
}

/// Sends an extra ephemeral message once the interaction has already been answered.
async fn follow_up_ephemeral(ctx: &Context, component: &MessageComponentInteraction, content: &str) {
    let sent = component.create_followup_message(&ctx.http, |m| m.content(content).ephemeral(true)).await;

    if let Err(ex) = sent {
        error!("Failed to send follow-up to {}: {}", component.user.id, ex);
    }
}

async fn create_ticket(ctx: &Context, component: &MessageComponentInteraction, category: &str) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };

    let db = db!(ctx);

    let ticket_channel = match db.get_tickets(guild_id).await {
        Ok(settings) => settings.ticket_channel_id.map(ChannelId),
        Err(ex) => {
            error!("Failed to load ticket settings for {}: {}", guild_id, ex);
            return reply_ephemeral(ctx, component, &failure_reply("creating", &ex)).await;
        }
    };

    let Some(ticket_channel) = ticket_channel else {
        return reply_ephemeral(ctx, component, "The ticket system is not set up in this server.").await;
    };

    component.create_interaction_response(&ctx.http, |r| r
        .kind(InteractionResponseType::DeferredChannelMessageWithSource)
        .interaction_response_data(|d| d.ephemeral(true))
    ).await?;

    // The deferred reply must always be edited, or the user is left waiting.
    let (settings, thread) = match open_ticket(ctx, &db, component, guild_id, ticket_channel, category).await {
        Ok(opened) => opened,
        Err(ex) => {
            error!("Failed to create {} ticket in guild {}: {}", category, guild_id, ex);
            component.edit_original_interaction_response(&ctx.http, |r| r.content(failure_reply("creating", &ex))).await?;
            return Ok(());
        }
    };

    component.edit_original_interaction_response(&ctx.http, |r| r.content("Ticket created!")).await?;

    if let Some(log_channel) = settings.log_channel_id.map(ChannelId) {
        let member = &component.user;
        let opened = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let url = jump_url(guild_id, thread.id);

        let logged = log_channel.send_message(&ctx.http, |m| m
            .embed(|e| e
                .title("Ticket Opened")
                .colour(GREEN)
                .thumbnail(member.face())
                .field("Created By", display_name(component), false)
                .field("User ID", member.id, false)
                .field("Opened", opened, false)
                .field("Category", category, false)
                .field("Ticket Name", &thread.name, false))
            .components(|c| c.create_action_row(|r| r
                .create_button(|b| b
                    .label("Go to Ticket")
                    .style(ButtonStyle::Link)
                    .url(url))))
        ).await;

        if let Err(ex) = logged {
            error!("Failed to log ticket {} in guild {}: {}", thread.name, guild_id, ex);
        }
    }

    Ok(())
}

fn display_name(component: &MessageComponentInteraction) -> String {
    component.member.as_ref()
        .map(|m| m.display_name().to_string())
        .unwrap_or_else(|| component.user.name.clone())
}

/// Reserves a number, makes the private thread and posts its opening message.
async fn open_ticket(
    ctx: &Context,
    db: &Database,
    component: &MessageComponentInteraction,
    guild_id: GuildId,
    ticket_channel: ChannelId,
    category: &str
) -> Result<(TicketSettings, GuildChannel), Error> {
    let (settings, number) = reserve_ticket(ctx, db, guild_id).await?;
    let member = &component.user;

    let thread = ticket_channel.create_private_thread(&ctx.http, |t| t
        .name(thread_name(number, &display_name(component)))
        .auto_archive_duration(ARCHIVE_AFTER_MINUTES)
    ).await?;

    thread.id.add_thread_member(&ctx.http, member.id).await?;

    let role_mentions = settings.ticket_roles.iter()
        .map(|id| RoleId(*id))
        .filter(|role| ctx.cache.role(guild_id, *role).is_some())
        .map(|role| format!("<@&{role}>"))
        .collect::<Vec<_>>()
        .join(" ");

    thread.id.send_message(&ctx.http, |m| m
        .content(format!("<@{}> {}", member.id, role_mentions))
        .embed(|e| e
            .title(format!("{category} Ticket"))
            .description("Support will be with you shortly. Click the button to close this ticket.")
            .field("Explain your issue", "Provide details about your issue to help us assist you.", false))
        .components(|c| c.create_action_row(|r| r
            .create_button(|b| b
                .custom_id(format!("{CLOSE_PREFIX}{}", thread.id))
                .label("Close Ticket")
                .style(ButtonStyle::Danger))))
    ).await?;

    Ok((settings, thread))
}

async fn fetch_history(ctx: &Context, channel_id: ChannelId) -> Result<Vec<Message>, Error> {
    let mut messages: Vec<Message> = Vec::new();
    let mut before: Option<MessageId> = None;

    loop {
        let page = channel_id.messages(&ctx.http, |r| {
            r.limit(HISTORY_PAGE);
            if let Some(before) = before {
                r.before(before);
            }
            r
        }).await?;

        let done = (page.len() as u64) < HISTORY_PAGE;
        before = page.last().map(|message| message.id);
        messages.extend(page);

        if done || before.is_none() {
            break;
        }
    }

    Ok(messages)
}

fn transcript_file(name: &str, transcript: &str) -> AttachmentType<'static> {
    AttachmentType::Bytes {
        data: Cow::Owned(transcript.as_bytes().to_vec()),
        filename: format!("{name}_transcript.txt")
    }
}

async fn close_ticket(ctx: &Context, component: &MessageComponentInteraction, thread_id: ChannelId) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };

    let thread = match thread_id.to_channel(ctx).await {
        Ok(Channel::Guild(thread)) if thread.guild_id == guild_id => thread,
        Ok(_) => return reply_ephemeral(ctx, component, "This ticket no longer exists.").await,
        Err(ex) => {
            error!("Failed to fetch ticket thread {}: {}", thread_id, ex);
            return reply_ephemeral(ctx, component, &failure_reply("closing", &ex.into())).await;
        }
    };

    let archived = thread.thread_metadata.as_ref().map(|meta| meta.archived).unwrap_or(false);

    if archived {
        component.create_interaction_response(&ctx.http, |r| r
            .kind(InteractionResponseType::DeferredUpdateMessage)
        ).await?;
    } else {
        component.create_interaction_response(&ctx.http, |r| r
            .kind(InteractionResponseType::ChannelMessageWithSource)
            .interaction_response_data(|d| d
                .ephemeral(true)
                .embed(|e| e
                    .title("Closed")
                    .description("Your ticket has been closed.")
                    .colour(RED)))
        ).await?;
    }

    if let Err(ex) = finish_close(ctx, component, guild_id, &thread).await {
        error!("Failed to close ticket {}: {}", thread.name, ex);
        follow_up_ephemeral(ctx, component, &failure_reply("closing", &ex)).await;
    }

    Ok(())
}

/// Archives and locks the thread, then hands out transcripts and the log entry.
async fn finish_close(ctx: &Context, component: &MessageComponentInteraction, guild_id: GuildId, thread: &GuildChannel) -> Result<(), Error> {
    let thread_id = thread.id;
    thread_id.edit_thread(&ctx.http, |t| t.archived(true).locked(true)).await?;

    let db = db!(ctx);
    let settings = db.get_tickets(guild_id).await?;
    let log_channel = settings.log_channel_id.map(ChannelId);

    if settings.transcript_enabled {
        let transcript = build_transcript(&fetch_history(ctx, thread_id).await?);

        if settings.dm_on_close {
            let dm = component.user.direct_message(ctx, |m| m.add_file(transcript_file(&thread.name, &transcript))).await;
            if let Err(ex) = dm {
                warn!("Could not DM transcript to {}: {}", component.user.id, ex);
            }
        }

        if let Some(log_channel) = log_channel {
            let sent = log_channel.send_message(&ctx.http, |m| m.add_file(transcript_file(&thread.name, &transcript))).await;
            if let Err(ex) = sent {
                error!("Failed to log transcript for {}: {}", thread.name, ex);
            }
        }
    }

    if let Some(log_channel) = log_channel {
        let url = jump_url(guild_id, thread_id);

        log_channel.send_message(&ctx.http, |m| m.embed(|e| e
            .title("Ticket Closed")
            .description(format!("The ticket '{}' has been closed.", thread.name))
            .colour(RED)
            .field("Closed By", format!("<@{}>", component.user.id), false)
            .field("Thread", format!("[Jump to Ticket]({url})"), false)
        )).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_buttons() {
        assert_eq!(parse_button("create_ticket_Bug Reports"), Some(TicketButton::Create("Bug Reports")));
        assert_eq!(parse_button("create_ticket_with_underscores"), Some(TicketButton::Create("with_underscores")));
    }

    #[test]
    fn parses_close_buttons() {
        assert_eq!(parse_button("close_ticket_1234567890"), Some(TicketButton::Close(ChannelId(1234567890))));
        assert_eq!(parse_button("close_ticket_abc"), None);
    }

    #[test]
    fn ignores_other_buttons() {
        assert_eq!(parse_button("autovoice_lock"), None);
    }

    #[test]
    fn thread_names_fit_discord() {
        assert_eq!(thread_name(4, "Deckard"), "ticket-4-Deckard");
        assert_eq!(thread_name(4, &"x".repeat(200)).chars().count(), MAX_THREAD_NAME);
    }

    #[test]
    fn failures_are_explained() {
        let ex: Error = "Missing Permissions".into();
        assert_eq!(failure_reply("creating", &ex), "Something went wrong while creating the ticket: Missing Permissions");
        assert_eq!(failure_reply("closing", &ex), "Something went wrong while closing the ticket: Missing Permissions");
    }

    #[test]
    fn transcript_lines_use_utc() {
        assert_eq!(transcript_line("Cain", 0, "Stay awhile"), "Cain [1970-01-01 00:00:00]: Stay awhile\n");
    }
}
