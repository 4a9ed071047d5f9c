mod models;
mod commands;
mod services;

use std::collections::HashSet;
use std::env;
use std::error;
use std::fs;
use std::sync::Arc;
use commands::get_framework;
use models::config::Config;
use services::database::Database;
use serenity::{
    http::Http,
    model::{gateway::GatewayIntents, id::UserId},
    model::application::command::Command
};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

type Error = Box<dyn error::Error + Send + Sync>;
type HoradricContext<'a> = poise::Context<'a, (), Error>;

pub const USER_AGENT: &str = concat!("Horadric/", env!("CARGO_PKG_VERSION"));

fn init_logger() -> std::io::Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::hourly("logs", "horadric.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing::subscriber::set_global_default(
        fmt::Subscriber::builder()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .with_ansi(true)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
            .with(fmt::Layer::default().with_ansi(false).with_writer(non_blocking))
    ).map_err(|ex| std::io::Error::new(std::io::ErrorKind::Other, ex))?;

    const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");
    info!("Initializing Horadric v{}", VERSION.unwrap_or("<unknown>"));
    info!("Reading from {}", env::current_dir()?.display());

    Ok(guard)
}

async fn fetch_bot_info(token: &str) -> Result<(UserId, HashSet<UserId>), Error> {
    let http = Http::new(token);

    let info = http.get_current_application_info().await?;
    let mut owners = HashSet::new();

    if let Some(team) = info.team {
        owners.insert(team.owner_user_id);
    } else {
        owners.insert(info.owner.id);
    }

    let app_id = http.get_current_user().await?.id;

    Ok((app_id, owners))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Dropping the guard stops the file writer, so it lives as long as main.
    let _guard = match init_logger() {
        Ok(guard) => Some(guard),
        Err(ex) => {
            eprintln!("Failed to initialize logger: {ex}");
            None
        }
    };

    let config_json = fs::read_to_string("config.json").map_err(|ex| {
        error!("config.json not found: {}", ex);
        ex
    })?;
    let config: Config = serde_json::from_str(&config_json).map_err(|ex| {
        error!("config.json is malformed: {}", ex);
        ex
    })?;
    let config = Arc::new(config);

    let token = config.token.clone();
    let (app_id, owners) = fetch_bot_info(&token).await?;
    let framework = get_framework(&config.cmd_prefix, owners).await;
    let database = Arc::new(Database::new(&config.sql_server_ip, config.sql_server_port, &config.sql_server_username, &config.sql_server_password).await?);

    let result = poise::Framework::builder()
        .token(&token)
        .intents(GatewayIntents::all())
        .options(framework)
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                {
                    let mut data = ctx.data.write().await;
                    data.insert::<Database>(database);
                    data.insert::<Config>(config);
                    data.insert::<commands::autovoice::CreatedChannels>(Arc::new(Default::default()));
                    data.insert::<commands::autovoice::AutoVoiceLock>(Arc::new(Default::default()));
                    data.insert::<commands::simpletickets::TicketLock>(Arc::new(Default::default()));
                }

                // Background feeds run for the lifetime of the process.
                #[allow(clippy::let_underscore_future)]
                let _ = tokio::task::spawn(commands::egnotifier::check_free_games(ctx.clone()));
                #[allow(clippy::let_underscore_future)]
                let _ = tokio::task::spawn(commands::battlemetrics::update_server_feeds(ctx.clone()));

                let command_builders = poise::builtins::create_application_commands(&framework.options().commands);
                let try_create_commands = Command::set_global_application_commands(&ctx.http, |commands| {
                    *commands = command_builders;
                    commands
                }).await;

                if let Err(ex) = try_create_commands {
                    error!("Failed to create slash commands: {}", ex);
                }

                info!("Application {} is set up", app_id);

                Ok(())
            })
        })
        .run()
        .await;

    if let Err(ex) = result {
        error!("Discord bot client error: {:?}", ex);
    }

    Ok(())
}
