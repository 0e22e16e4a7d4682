//! Endpoint failover
//!
//! Endpoints are tried in priority order. Each endpoint gets up to
//! `max_attempts` connect-and-verify attempts with backoff in between; the
//! next endpoint is tried immediately once an endpoint is exhausted.
//!
//! ```text
//! Disconnected -> Connecting -> Verifying -> Connected
//!                                   |
//!                                   v
//!                             Disconnected (retry / next endpoint) -> Exhausted
//! ```

use super::{ChainGateway, GatewayConnector, GatewayError, GatewayResult, RetryPolicy};
use crate::metrics::MetricsState;
use parking_lot::Mutex;
use std::sync::Arc;

/// Last observed connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Verifying,
    Connected,
    /// Every endpoint failed on the last acquire
    Exhausted,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Verifying => write!(f, "VERIFYING"),
            Self::Connected => write!(f, "CONNECTED"),
            Self::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

/// Hands out verified gateway handles
pub struct EndpointSelector {
    /// Endpoints in priority order
    endpoints: Vec<String>,
    /// Opens raw sessions
    connector: Arc<dyn GatewayConnector>,
    /// Per-endpoint retry policy
    policy: RetryPolicy,
    state: Mutex<ConnectionState>,
    metrics: Option<Arc<MetricsState>>,
}

impl EndpointSelector {
    /// Create a new selector
    pub fn new(
        endpoints: Vec<String>,
        connector: Arc<dyn GatewayConnector>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            endpoints,
            connector,
            policy,
            state: Mutex::new(ConnectionState::Disconnected),
            metrics: None,
        }
    }

    /// Count connection failures in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsState>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Acquire a verified handle. The caller owns it and must close it.
    pub async fn acquire(&self) -> GatewayResult<Box<dyn ChainGateway>> {
        if self.endpoints.is_empty() {
            return Err(GatewayError::NoEndpoints);
        }

        let mut attempts = 0u32;
        let mut last_error = None;

        for endpoint in &self.endpoints {
            let result = self
                .policy
                .run(endpoint, |attempt| {
                    attempts += 1;
                    self.connect_and_verify(endpoint, attempt)
                })
                .await;

            match result {
                Ok(gateway) => {
                    self.set_state(ConnectionState::Connected);
                    tracing::debug!(endpoint = %endpoint, "Gateway connected");
                    return Ok(gateway);
                }
                Err(e) => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        error = %e,
                        "Endpoint exhausted, moving to next"
                    );
                    last_error = Some(e);
                }
            }
        }

        self.set_state(ConnectionState::Exhausted);
        tracing::error!(attempts = attempts, "All gateway endpoints failed");

        Err(GatewayError::ConnectionExhausted {
            attempts,
            source: Box::new(last_error.unwrap_or(GatewayError::NoEndpoints)),
        })
    }

    /// One attempt: open a session and verify it with a block height query
    async fn connect_and_verify(
        &self,
        endpoint: &str,
        attempt: u32,
    ) -> GatewayResult<Box<dyn ChainGateway>> {
        self.set_state(ConnectionState::Connecting);
        let gateway = match self.connector.connect(endpoint).await {
            Ok(gateway) => gateway,
            Err(e) => {
                self.record_failure(endpoint);
                self.set_state(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        self.set_state(ConnectionState::Verifying);
        match gateway.get_current_block().await {
            Ok(block) => {
                tracing::trace!(
                    endpoint = %endpoint,
                    attempt = attempt,
                    block = block,
                    "Gateway verified"
                );
                Ok(gateway)
            }
            Err(e) => {
                gateway.close().await;
                self.record_failure(endpoint);
                self.set_state(ConnectionState::Disconnected);
                Err(GatewayError::Connection(format!(
                    "verification against {} failed: {}",
                    endpoint, e
                )))
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    fn record_failure(&self, endpoint: &str) {
        if let Some(metrics) = &self.metrics {
            metrics
                .gateway_connect_failures
                .with_label_values(&[endpoint])
                .inc();
        }
    }
}
