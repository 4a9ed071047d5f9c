use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{Error, USER_AGENT};
use super::battlemetrics_models::*;

const BASE_URL: &str = "https://api.battlemetrics.com";

/// Thin authenticated client; one per configured server since each carries its own token.
pub struct BattleMetrics {
    client: Client,
    token: String
}

impl BattleMetrics {
    pub fn new(token: &str) -> Self {
        BattleMetrics { client: Client::new(), token: token.to_string() }
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<Document<T>, Error> {
        let status = response.status();
        let text = response.text().await?;

        serde_json::from_str(&text)
            .map_err(|ex| format!("BattleMetrics returned HTTP {} with an unreadable body: {}", status.as_u16(), ex).into())
    }

    pub async fn server_info(&self, server_id: &str) -> Result<Document<Resource<ServerAttributes>>, Error> {
        let response = self.client
            .get(format!("{BASE_URL}/servers/{server_id}"))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::read(response).await
    }

    pub async fn send_console_command(&self, server_id: &str, command: &str) -> Result<Document<Resource<CommandResult>>, Error> {
        let response = self.client
            .post(format!("{BASE_URL}/servers/{server_id}/command"))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .json(&CommandRequest::raw(command))
            .send()
            .await?;

        Self::read(response).await
    }

    pub async fn ban_list(&self, server_id: &str) -> Result<Document<Vec<Resource<BanAttributes>>>, Error> {
        let response = self.client
            .get(format!("{BASE_URL}/bans"))
            .query(&[("filter[server]", server_id)])
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::read(response).await
    }
}
