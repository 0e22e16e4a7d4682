//! Periodic staking digest
//!
//! On every block whose height is a multiple of the configured interval, the
//! batch buffer is drained and, if it held any purchases, sent to the default
//! chat. A failed send is logged and the drained events are dropped.

use super::MessagingService;
use crate::history::SharedHistory;
use crate::metrics::MetricsState;
use crate::models::PurchaseEvent;
use std::sync::Arc;

/// Outcome of one publish check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOutcome {
    /// Block is off-cadence, the batch buffer is empty or messaging is
    /// disabled
    Skipped,
    Sent,
    Failed,
}

/// Format the digest message (Markdown)
pub fn format_digest(events: &[PurchaseEvent], summary: &str, block: u64) -> String {
    let mut lines = vec![
        "*Staking Update*".to_string(),
        format!("Block: `{}`", block),
        String::new(),
        "*Summary:*".to_string(),
        summary.to_string(),
    ];

    if !events.is_empty() {
        lines.push(String::new());
        lines.push("*Purchase History:*".to_string());
        lines.extend(events.iter().map(PurchaseEvent::digest_line));
    }

    lines.join("\n")
}

/// Publishes the batch buffer on a block cadence
pub struct DigestPublisher {
    messaging: Arc<dyn MessagingService>,
    history: SharedHistory,
    /// Cadence in blocks
    interval: u64,
    metrics: Option<Arc<MetricsState>>,
}

impl DigestPublisher {
    pub fn new(messaging: Arc<dyn MessagingService>, history: SharedHistory, interval: u64) -> Self {
        Self {
            messaging,
            history,
            interval,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsState>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Whether `block` is on the digest cadence
    pub fn is_due(&self, block: u64) -> bool {
        self.interval > 0 && block % self.interval == 0
    }

    /// Send the digest for `block` if it is due and there is something to report
    pub async fn maybe_publish(&self, block: u64, summary: &str) -> DigestOutcome {
        if !self.is_due(block) {
            return DigestOutcome::Skipped;
        }

        let events = {
            let mut history = self.history.lock();
            if history.batch().is_empty() {
                return DigestOutcome::Skipped;
            }
            history.take_batch()
        };

        if !self.messaging.is_enabled() {
            tracing::debug!(
                block = block,
                events = events.len(),
                "Messaging disabled, staking digest dropped"
            );
            return DigestOutcome::Skipped;
        }

        let message = format_digest(&events, summary, block);
        match self.messaging.send(&message, None).await {
            Ok(()) => {
                tracing::info!(block = block, events = events.len(), "Staking digest sent");
                if let Some(metrics) = &self.metrics {
                    metrics.digests_sent.inc();
                }
                DigestOutcome::Sent
            }
            Err(e) => {
                tracing::error!(
                    block = block,
                    events = events.len(),
                    error = %e,
                    "Failed to send staking digest"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.digests_failed.inc();
                }
                DigestOutcome::Failed
            }
        }
    }
}
