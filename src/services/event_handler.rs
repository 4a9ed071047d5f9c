use serenity::{
    client::Context,
    model::application::interaction::{
        message_component::MessageComponentInteraction,
        Interaction
    }
};
use tracing::{debug, error};

use crate::commands::autovoice::autovoice_handler::{self, LOCK_BUTTON, UNLOCK_BUTTON};
use crate::commands::simpletickets::tickets_handler::{self, TicketButton};
use super::bot_init;

/// Where a button press should go.
#[derive(Debug, PartialEq, Eq)]
enum ComponentRoute<'a> {
    AutoVoice { locked: bool },
    Ticket(TicketButton<'a>)
}

fn route(custom_id: &str) -> Option<ComponentRoute<'_>> {
    match custom_id {
        LOCK_BUTTON => Some(ComponentRoute::AutoVoice { locked: true }),
        UNLOCK_BUTTON => Some(ComponentRoute::AutoVoice { locked: false }),
        _ => tickets_handler::parse_button(custom_id).map(ComponentRoute::Ticket)
    }
}

async fn component(ctx: &Context, component: &MessageComponentInteraction) {
    // Buttons we don't own (poise's register buttons, collectors) are left alone.
    let Some(route) = route(&component.data.custom_id) else {
        debug!("Ignoring component {}", component.data.custom_id);
        return;
    };

    let result = match route {
        ComponentRoute::AutoVoice { locked } => autovoice_handler::handle_button(ctx, component, locked).await,
        ComponentRoute::Ticket(button) => tickets_handler::handle_button(ctx, component, button).await
    };

    if let Err(ex) = result {
        error!("Failed to handle button {}: {}", component.data.custom_id, ex);
    }
}

pub async fn handle(ctx: &Context, event: &poise::Event<'_>) {
    match event {
        poise::Event::Ready { data_about_bot } => bot_init::ready(ctx, data_about_bot).await,
        poise::Event::VoiceStateUpdate { old, new } => autovoice_handler::voice_state_update(ctx, old.as_ref(), new).await,
        poise::Event::InteractionCreate { interaction: Interaction::MessageComponent(interaction) } => component(ctx, interaction).await,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::model::id::ChannelId;

    #[test]
    fn routes_autovoice_buttons() {
        assert_eq!(route("autovoice_lock"), Some(ComponentRoute::AutoVoice { locked: true }));
        assert_eq!(route("autovoice_unlock"), Some(ComponentRoute::AutoVoice { locked: false }));
    }

    #[test]
    fn routes_ticket_buttons() {
        assert_eq!(route("create_ticket_Support"), Some(ComponentRoute::Ticket(TicketButton::Create("Support"))));
        assert_eq!(route("close_ticket_42"), Some(ComponentRoute::Ticket(TicketButton::Close(ChannelId(42)))));
    }

    #[test]
    fn leaves_foreign_buttons_alone() {
        assert_eq!(route("register.global"), None);
        assert_eq!(route("close_ticket_"), None);
    }
}
