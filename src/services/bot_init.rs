use serenity::{
    client::Context,
    model::{
        gateway::Ready
    }
};
use tracing::info;

use crate::commands::{autovoice::autovoice_handler, simpletickets::tickets_handler};

pub async fn ready(ctx: &Context, ready: &Ready) {
    info!("Logged in as {} in {} guilds", ready.user.name, ready.guilds.len());

    autovoice_handler::restore(ctx).await;
    tickets_handler::restore(ctx).await;
}
