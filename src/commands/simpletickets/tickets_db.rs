use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;

use crate::{Database, Error};
use crate::services::database::Scope;

const TICKETS: &str = "simpletickets";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketSettings {
    pub ticket_channel_id: Option<u64>,
    pub log_channel_id: Option<u64>,
    pub message_id: Option<u64>,
    pub categories: Vec<String>,
    pub ticket_counter: u64,
    pub dm_on_close: bool,
    pub transcript_enabled: bool,
    pub ticket_roles: Vec<u64>
}

impl Default for TicketSettings {
    fn default() -> Self {
        TicketSettings {
            ticket_channel_id: None,
            log_channel_id: None,
            message_id: None,
            categories: Vec::new(),
            ticket_counter: 1,
            dm_on_close: false,
            transcript_enabled: false,
            ticket_roles: Vec::new()
        }
    }
}

impl TicketSettings {
    /// Returns false if the category already existed.
    pub fn add_category(&mut self, name: &str) -> bool {
        if self.categories.iter().any(|category| category == name) {
            return false;
        }

        self.categories.push(name.to_string());
        true
    }

    pub fn remove_category(&mut self, name: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|category| category != name);
        before != self.categories.len()
    }

    pub fn add_roles(&mut self, roles: impl IntoIterator<Item = u64>) {
        for role in roles {
            if !self.ticket_roles.contains(&role) {
                self.ticket_roles.push(role);
            }
        }
    }

    /// Hands out the current ticket number and advances the counter.
    pub fn next_ticket(&mut self) -> u64 {
        let number = self.ticket_counter;
        self.ticket_counter += 1;
        number
    }
}

impl Database {
    pub async fn get_tickets(&self, guild_id: GuildId) -> Result<TicketSettings, Error> {
        self.get_setting(Scope::Guild, guild_id.0, TICKETS).await
    }

    pub async fn set_tickets(&self, guild_id: GuildId, settings: &TicketSettings) -> Result<(), Error> {
        self.set_setting(Scope::Guild, guild_id.0, TICKETS, settings).await
    }

    pub async fn get_ticket_guilds(&self) -> Result<Vec<GuildId>, Error> {
        Ok(self.owners_with_setting(Scope::Guild, TICKETS).await?
            .into_iter()
            .map(GuildId)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_one() {
        let settings: TicketSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.ticket_counter, 1);
        assert!(!settings.dm_on_close);
        assert_eq!(settings, TicketSettings::default());
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let settings: TicketSettings = serde_json::from_str(r#"{"categories": ["Billing"], "ticket_counter": 7}"#).unwrap();
        assert_eq!(settings.categories, vec!["Billing".to_string()]);
        assert_eq!(settings.ticket_counter, 7);
        assert!(settings.ticket_roles.is_empty());
    }

    #[test]
    fn next_ticket_advances() {
        let mut settings = TicketSettings::default();
        assert_eq!(settings.next_ticket(), 1);
        assert_eq!(settings.next_ticket(), 2);
        assert_eq!(settings.ticket_counter, 3);
    }

    #[test]
    fn categories_are_unique() {
        let mut settings = TicketSettings::default();
        assert!(settings.add_category("Billing"));
        assert!(!settings.add_category("Billing"));
        assert!(settings.remove_category("Billing"));
        assert!(!settings.remove_category("Billing"));
    }

    #[test]
    fn roles_are_unique() {
        let mut settings = TicketSettings::default();
        settings.add_roles([1, 2, 1]);
        settings.add_roles([2, 3]);
        assert_eq!(settings.ticket_roles, vec![1, 2, 3]);
    }
}
