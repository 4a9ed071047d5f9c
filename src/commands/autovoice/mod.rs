mod autovoice_config;
mod autovoice_db;
mod controls;
pub mod autovoice_handler;

use std::sync::Arc;
use dashmap::DashSet;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::TypeMapKey;
use tokio::sync::Mutex;

pub use autovoice_config::*;
pub use controls::*;

pub const NOT_IN_CREATED_CHANNEL: &str = "You are not in a created voice channel or it doesn't exist.";

/// Voice channels this bot created, across every guild.
pub struct CreatedChannels;

impl TypeMapKey for CreatedChannels {
    type Value = Arc<DashSet<ChannelId>>;
}

pub(crate) async fn created_channels(ctx: &Context) -> Arc<DashSet<ChannelId>> {
    let data = ctx.data.read().await;
    data.get::<CreatedChannels>().expect("Couldn't find created channels").clone()
}

/// Held across every read-modify-write of a guild's autovoice settings.
pub struct AutoVoiceLock;

impl TypeMapKey for AutoVoiceLock {
    type Value = Arc<Mutex<()>>;
}

pub(crate) async fn autovoice_lock(ctx: &Context) -> Arc<Mutex<()>> {
    let data = ctx.data.read().await;
    data.get::<AutoVoiceLock>().expect("Couldn't find autovoice lock").clone()
}

/// The voice channel a user currently sits in, according to the cache.
pub(crate) fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    ctx.cache.guild(guild_id)
        .and_then(|guild| guild.voice_states.get(&user_id).and_then(|state| state.channel_id))
}

/// The user's voice channel, but only if we created it.
pub(crate) async fn owned_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let channel = user_voice_channel(ctx, guild_id, user_id)?;

    if created_channels(ctx).await.contains(&channel) {
        Some(channel)
    } else {
        None
    }
}

pub(crate) fn channel_name(ctx: &Context, channel_id: ChannelId) -> String {
    ctx.cache.guild_channel(channel_id)
        .map(|channel| channel.name)
        .unwrap_or_else(|| format!("<#{channel_id}>"))
}
