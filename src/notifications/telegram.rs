//! Telegram messaging service
//!
//! Sends Markdown messages and polls `getUpdates` for operator commands via
//! the Telegram Bot API.

use super::{InboundMessage, MessagingService};
use crate::config::TelegramConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// `getUpdates` response envelope
#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    channel_post: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

impl Update {
    /// Direct messages and channel posts are both accepted as commands.
    /// Updates carrying neither keep their id so the cursor still advances.
    fn into_inbound(self) -> InboundMessage {
        match self.message.or(self.channel_post) {
            Some(message) => InboundMessage {
                update_id: self.update_id,
                chat_id: message.chat.id.to_string(),
                text: message.text,
            },
            None => InboundMessage {
                update_id: self.update_id,
                chat_id: String::new(),
                text: None,
            },
        }
    }
}

/// Telegram Bot API client
pub struct TelegramClient {
    /// Bot token
    bot_token: SecretString,
    /// Default chat for digests
    chat_id: String,
    /// Bot API base URL
    api_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(config: &TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            bot_token: SecretString::new(config.token.expose_secret().clone()),
            chat_id: config.chat_id.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_url,
            self.bot_token.expose_secret(),
            method
        )
    }
}

#[async_trait::async_trait]
impl MessagingService for TelegramClient {
    async fn send(&self, text: &str, destination: Option<&str>) -> anyhow::Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let payload = serde_json::json!({
            "chat_id": destination.unwrap_or(&self.chat_id),
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error: {} - {}", status, body);
        }

        tracing::debug!(chat_id = destination.unwrap_or(&self.chat_id), "Sent Telegram message");
        Ok(())
    }

    async fn poll(&self, offset: i64) -> anyhow::Result<Vec<InboundMessage>> {
        let response: UpdatesResponse = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("offset", offset)])
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            anyhow::bail!(
                "Telegram getUpdates failed: {}",
                response.description.unwrap_or_default()
            );
        }

        let mut messages: Vec<InboundMessage> =
            response.result.into_iter().map(Update::into_inbound).collect();
        messages.sort_by_key(|m| m.update_id);
        Ok(messages)
    }

    fn is_enabled(&self) -> bool {
        !self.bot_token.expose_secret().is_empty() && !self.chat_id.is_empty()
    }
}
