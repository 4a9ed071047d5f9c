mod general;
pub mod autovoice;
pub mod battlemetrics;
mod clonetracker;
mod deckardcain;
pub mod egnotifier;
mod gaiaonline;
mod minecraft;
mod pokedex;
mod server_tools;
pub mod simpletickets;
mod steamapp;
mod timestamps;

use std::collections::HashSet;
use serenity::model::id::UserId;
use tracing::error;

use crate::{HoradricContext, Error};

/// What a group command does when called without a subcommand.
pub(crate) async fn group_help(ctx: HoradricContext<'_>) -> Result<(), Error> {
    let name = ctx.command().qualified_name.clone();
    general::help_single_command(ctx, &name).await
}

async fn on_error(error: poise::FrameworkError<'_, (), Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx } => {
            error!("Command {} failed: {}", ctx.command().qualified_name, error);

            if let Err(ex) = ctx.say(format!("An error occurred: {error}")).await {
                error!("Failed to report command error: {}", ex);
            }
        }
        poise::FrameworkError::ArgumentParse { error, input, ctx } => {
            let reply = match input {
                Some(input) => format!("Could not understand `{input}`: {error}"),
                None => format!("Missing or invalid arguments: {error}")
            };

            if let Err(ex) = ctx.say(reply).await {
                error!("Failed to report argument error: {}", ex);
            }
        }
        poise::FrameworkError::NotAnOwner { ctx } => {
            if let Err(ex) = ctx.send(|m| m.content("You are not the bot owner.").ephemeral(true)).await {
                error!("Failed to report owner check: {}", ex);
            }
        }
        other => {
            if let Err(ex) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", ex);
            }
        }
    }
}

pub async fn get_framework(pref: &str, owners: HashSet<UserId>) -> poise::FrameworkOptions<(), Error> {
    poise::FrameworkOptions {
        commands: vec![
            general::help(),
            general::info(),
            general::register(),
            autovoice::autovoice(),
            autovoice::autovoiceset(),
            battlemetrics::setserver(),
            battlemetrics::rcon(),
            battlemetrics::banlist(),
            battlemetrics::clearservers(),
            clonetracker::clonetracker(),
            clonetracker::clonedatadump(),
            deckardcain::setapikey(),
            deckardcain::askcain(),
            egnotifier::setepicchannel(),
            egnotifier::removeepicchannel(),
            gaiaonline::gaia(),
            minecraft::minecraft(),
            pokedex::pokedex(),
            pokedex::iteminfo(),
            server_tools::cloneperms(),
            server_tools::speak(),
            server_tools::stealemoji(),
            simpletickets::stickets(),
            steamapp::setsteamapikey(),
            steamapp::steamapikey(),
            steamapp::steamprofile(),
            steamapp::steamgame(),
            timestamps::timestamp()
        ],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(pref.to_string()),
            mention_as_prefix: true,
            ..Default::default()
        },
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, _framework, _data| {
            Box::pin(async move {
                crate::services::event_handler::handle(ctx, event).await;
                Ok(())
            })
        },
        owners,
        ..Default::default()
    }
}
