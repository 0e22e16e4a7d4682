//! Messaging channel for the staking agent
//!
//! One channel carries both directions:
//! - outbound: command replies and the periodic staking digest
//! - inbound: operator commands, polled with a monotonically advancing cursor

pub mod digest;
pub mod telegram;

pub use digest::{format_digest, DigestPublisher};
pub use telegram::TelegramClient;

/// One inbound update from the messaging channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Channel-assigned id; the next poll starts after the highest seen
    pub update_id: i64,
    /// Chat the message came from, used as the reply destination
    pub chat_id: String,
    /// Message text, absent for stickers, joins and other non-text updates
    pub text: Option<String>,
}

/// Messaging service trait
#[async_trait::async_trait]
pub trait MessagingService: Send + Sync {
    /// Send a Markdown message to `destination`, or to the default chat
    async fn send(&self, text: &str, destination: Option<&str>) -> anyhow::Result<()>;

    /// Fetch updates with id >= `offset`, in id order
    async fn poll(&self, offset: i64) -> anyhow::Result<Vec<InboundMessage>>;

    /// Check if the service is enabled
    fn is_enabled(&self) -> bool;
}

/// Messaging service used when no credentials are configured
pub struct DisabledMessaging;

#[async_trait::async_trait]
impl MessagingService for DisabledMessaging {
    async fn send(&self, _text: &str, _destination: Option<&str>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn poll(&self, _offset: i64) -> anyhow::Result<Vec<InboundMessage>> {
        Ok(Vec::new())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
