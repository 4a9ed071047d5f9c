mod cain_db;
mod openai;
mod openai_models;

use tracing::error;

use crate::{HoradricContext, Database, db, horadricdb, config, Error};
use openai_models::{ChatCompletionMessage, ChatCompletionRequest};

const PERSONA: &str = "You are Deckard Cain, an old wise scholar.";
const NO_KEY: &str = "API key is not set. Please ask the guild owner to use the setapikey command to set the API key for this guild.";

fn cain_request(model: &str, question: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatCompletionMessage::new("system", PERSONA),
            ChatCompletionMessage::new("user", question)
        ],
        temperature: 0.7,
        max_tokens: 50
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    owners_only,
    description_localized("en-US", "Set the OpenAI API key used by this server.")
)]
pub async fn setapikey(
    ctx: HoradricContext<'_>,
    #[description = "The OpenAI API key."] api_key: String)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    db.set_cain_api_key(guild_id, api_key.trim()).await?;

    ctx.send(|m| m.content("API key has been set successfully.").ephemeral(true)).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    description_localized("en-US", "Ask Deckard Cain a question.")
)]
pub async fn askcain(
    ctx: HoradricContext<'_>,
    #[description = "What to ask."] #[rest] question: String)
-> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let db = horadricdb!(ctx);
    let Some(api_key) = db.get_cain_api_key(guild_id).await? else {
        ctx.say(NO_KEY).await?;
        return Ok(());
    };

    ctx.defer().await?;

    let config = config!(ctx.serenity_context());
    let request = cain_request(&config.openai_model, &question);

    match openai::create_chat_completion(&api_key, &request).await {
        Ok(response) => {
            let reply = openai::first_reply(&response).unwrap_or_else(|| "...".to_string());
            ctx.say(reply).await?;
        }
        Err(ex) => {
            error!("Failed to ask Deckard Cain: {}", ex);
            ctx.say(format!("An error occurred: {ex}")).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_persona_first() {
        let request = cain_request("gpt-3.5-turbo", "What is the Horadric Cube?");

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content.as_deref(), Some(PERSONA));
        assert_eq!(request.messages[1].content.as_deref(), Some("What is the Horadric Cube?"));
        assert_eq!(request.max_tokens, 50);
    }
}
