//! Bounded retry with exponential backoff
//!
//! Backoff for attempt `n` (1-based) is `min_backoff * 2^(n-1)`, capped at
//! `max_backoff`. The delay is only applied between attempts, never after
//! the last one.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for connection verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// Backoff after the first failure
    pub min_backoff: Duration,
    /// Backoff cap
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_backoff,
            max_backoff: max_backoff.max(min_backoff),
        }
    }

    /// No backoff between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Delay to wait after failed attempt `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.min_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds or attempts are exhausted.
    ///
    /// Returns the last error on exhaustion.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::warn!(
                        operation = label,
                        attempt = attempt,
                        error = %e,
                        "Giving up after max attempts"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        operation = label,
                        attempt = attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying with backoff"
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
