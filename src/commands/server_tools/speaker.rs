use std::time::Duration;
use serenity::builder::CreateEmbed;
use serenity::model::channel::{GuildChannel, Message};
use tracing::error;

use crate::{HoradricContext, Error};
use crate::commands::group_help;

const REPLY_TIMEOUT: Duration = Duration::from_secs(60);

#[poise::command(prefix_command, slash_command,
    subcommands("say", "embed", "edit", "editembed"),
    discard_spare_arguments,
    description_localized("en-US", "Commands for bot speak actions."),
    aliases("sk"),
    guild_only,
    required_permissions = "ADMINISTRATOR",
    identifying_name = "Speaker"
)]
pub async fn speak(ctx: HoradricContext<'_>) -> Result<(), Error> {
    group_help(ctx).await
}

/// Which part of a bot message a plain-text edit replaces.
#[derive(Debug, PartialEq, Eq)]
enum EditTarget {
    EmbedTitle,
    EmbedDescription,
    Content
}

fn edit_target(message: &Message) -> EditTarget {
    match message.embeds.first() {
        Some(embed) if embed.title.is_some() => EditTarget::EmbedTitle,
        Some(_) => EditTarget::EmbedDescription,
        None => EditTarget::Content
    }
}

/// Hides the command invocation, like the bot spoke on its own.
async fn delete_invocation(ctx: HoradricContext<'_>) {
    if let poise::Context::Prefix(prefix) = ctx {
        if let Err(ex) = prefix.msg.delete(ctx.serenity_context()).await {
            error!("Failed to delete invoking message: {}", ex);
        }
    }
}

async fn prompt(ctx: HoradricContext<'_>, question: &str) -> Result<Option<String>, Error> {
    ctx.say(question).await?;

    let reply = ctx.author()
        .await_reply(ctx.serenity_context())
        .channel_id(ctx.channel_id())
        .timeout(REPLY_TIMEOUT)
        .await;

    Ok(reply.map(|message| message.content.clone()))
}

async fn fetch_bot_message(ctx: HoradricContext<'_>, channel: &GuildChannel, message_id: u64) -> Result<Option<Message>, Error> {
    let sctx = ctx.serenity_context();

    let message = match channel.id.message(&sctx.http, message_id).await {
        Ok(message) => message,
        Err(ex) => {
            error!("Failed to fetch message {}: {}", message_id, ex);
            ctx.say("Could not find the specified message.").await?;
            return Ok(None);
        }
    };

    if message.author.id != sctx.cache.current_user_id() {
        ctx.say("You can only edit messages sent by the bot.").await?;
        return Ok(None);
    }

    Ok(Some(message))
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Speak as the bot.")
)]
pub async fn say(
    ctx: HoradricContext<'_>,
    #[description = "Where to send the message."] destination: GuildChannel,
    #[description = "What to say."] #[rest] content: String)
-> Result<(), Error> {
    delete_invocation(ctx).await;

    destination.id.say(&ctx.serenity_context().http, content).await?;

    if let poise::Context::Application(_) = ctx {
        ctx.send(|m| m.content("Sent.").ephemeral(true)).await?;
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Create an embedded message as the bot.")
)]
pub async fn embed(
    ctx: HoradricContext<'_>,
    #[description = "Where to send the embed."] destination: GuildChannel)
-> Result<(), Error> {
    delete_invocation(ctx).await;

    let Some(title) = prompt(ctx, "Please enter the title for the embedded message:").await? else {
        ctx.say("Embed creation timed out.").await?;
        return Ok(());
    };

    let Some(description) = prompt(ctx, "Please enter the description for the embedded message:").await? else {
        ctx.say("Embed creation timed out.").await?;
        return Ok(());
    };

    destination.id.send_message(&ctx.serenity_context().http, |m| m.embed(|e| e
        .title(title)
        .description(description)
    )).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Edit a message sent by the bot.")
)]
pub async fn edit(
    ctx: HoradricContext<'_>,
    #[description = "The channel the message is in."] channel: GuildChannel,
    #[description = "The message's ID."] message_id: u64,
    #[description = "The new text."] #[rest] new_content: String)
-> Result<(), Error> {
    let Some(mut message) = fetch_bot_message(ctx, &channel, message_id).await? else {
        return Ok(());
    };

    let sctx = ctx.serenity_context();
    let target = edit_target(&message);

    match target {
        EditTarget::Content => {
            message.edit(sctx, |m| m.content(&new_content)).await?;
            ctx.say("Message edited.").await?;
        }
        EditTarget::EmbedTitle | EditTarget::EmbedDescription => {
            let mut embed = CreateEmbed::from(message.embeds[0].clone());
            if target == EditTarget::EmbedTitle {
                embed.title(&new_content);
            } else {
                embed.description(&new_content);
            }

            message.edit(sctx, |m| m.set_embed(embed)).await?;

            if target == EditTarget::EmbedTitle {
                ctx.say("Embedded message title edited.").await?;
            } else {
                ctx.say("Embedded message description edited.").await?;
            }
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    description_localized("en-US", "Rewrite the embedded message sent by the bot.")
)]
pub async fn editembed(
    ctx: HoradricContext<'_>,
    #[description = "The channel the message is in."] channel: GuildChannel,
    #[description = "The message's ID."] message_id: u64)
-> Result<(), Error> {
    let Some(mut message) = fetch_bot_message(ctx, &channel, message_id).await? else {
        return Ok(());
    };

    let Some(old_embed) = message.embeds.first().cloned() else {
        ctx.say("The specified message does not have an embed.").await?;
        return Ok(());
    };

    let Some(title) = prompt(ctx, "Please enter the new title for the embedded message:").await? else {
        ctx.say("Embed editing timed out.").await?;
        return Ok(());
    };

    let Some(description) = prompt(ctx, "Please enter the new description for the embedded message:").await? else {
        ctx.say("Embed editing timed out.").await?;
        return Ok(());
    };

    let mut embed = CreateEmbed::default();
    embed.title(title).description(description);
    if let Some(colour) = old_embed.colour {
        embed.colour(colour);
    }
    if let Some(timestamp) = old_embed.timestamp {
        embed.timestamp(timestamp);
    }

    message.edit(ctx.serenity_context(), |m| m.set_embed(embed)).await?;
    ctx.say("Embedded message edited.").await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with(embeds: serde_json::Value) -> Message {
        serde_json::from_value(serde_json::json!({
            "id": "1",
            "channel_id": "2",
            "author": { "id": "3", "username": "bot", "discriminator": "0000", "avatar": null, "bot": true },
            "content": "hello",
            "timestamp": "2024-01-01T00:00:00Z",
            "edited_timestamp": null,
            "tts": false,
            "mention_everyone": false,
            "mentions": [],
            "mention_roles": [],
            "attachments": [],
            "embeds": embeds,
            "pinned": false,
            "type": 0
        })).unwrap()
    }

    #[test]
    fn plain_messages_edit_content() {
        assert_eq!(edit_target(&message_with(serde_json::json!([]))), EditTarget::Content);
    }

    #[test]
    fn titled_embeds_edit_the_title() {
        let message = message_with(serde_json::json!([{ "title": "Rules", "description": "Be nice" }]));
        assert_eq!(edit_target(&message), EditTarget::EmbedTitle);
    }

    #[test]
    fn untitled_embeds_edit_the_description() {
        let message = message_with(serde_json::json!([{ "description": "Be nice" }]));
        assert_eq!(edit_target(&message), EditTarget::EmbedDescription);
    }
}
