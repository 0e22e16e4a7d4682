//! Control channel polling loop
//!
//! Polls the messaging channel for new updates, interprets each text message
//! in id order and replies to the chat it came from. Errors are logged and
//! polling continues; only cancellation stops the loop.

use super::interpreter::CommandInterpreter;
use crate::notifications::MessagingService;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Control channel driver
pub struct ControlLoop {
    messaging: Arc<dyn MessagingService>,
    interpreter: CommandInterpreter,
    /// Pause between polls
    poll_interval: Duration,
}

impl ControlLoop {
    pub fn new(
        messaging: Arc<dyn MessagingService>,
        interpreter: CommandInterpreter,
        poll_interval: Duration,
    ) -> Self {
        Self {
            messaging,
            interpreter,
            poll_interval,
        }
    }

    /// Poll until cancelled
    pub async fn run(&self, cancel_token: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "Starting control channel polling"
        );

        let mut offset = 0;
        loop {
            offset = self.poll_once(offset).await;

            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::info!("Control channel polling shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// One poll. Returns the cursor for the next poll.
    pub async fn poll_once(&self, offset: i64) -> i64 {
        let messages = match self.messaging.poll(offset).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(offset = offset, error = %e, "Failed to poll control channel");
                return offset;
            }
        };

        let mut next_offset = offset;
        for message in messages {
            next_offset = next_offset.max(message.update_id + 1);

            let text = match message.text {
                Some(text) => text,
                None => continue,
            };

            let reply = self.interpreter.handle(&text).await;
            if let Err(e) = self.messaging.send(&reply, Some(&message.chat_id)).await {
                tracing::warn!(
                    update_id = message.update_id,
                    chat_id = %message.chat_id,
                    error = %e,
                    "Failed to send command reply"
                );
            }
        }

        next_offset
    }
}
