pub mod bot_init;
pub mod database;
pub mod event_handler;
