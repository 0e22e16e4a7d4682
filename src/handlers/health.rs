//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::gateway::{ConnectionState, EndpointSelector};
use crate::metrics::MetricsState;
use crate::state::SharedState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Uptime in seconds
    pub uptime_seconds: i64,
    /// Whether automatic allocation is paused
    pub paused: bool,
    /// Last block processed by the block cycle (0 before the first)
    pub last_block: i64,
    /// Base stake unit in TAO
    pub stake_amount: f64,
    /// Gateway connection status
    pub gateway: GatewayHealth,
}

/// Health status enum
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Connecting or retrying
    Degraded,
    /// Every gateway endpoint failed
    Unhealthy,
}

/// Gateway health info
#[derive(Debug, Serialize)]
pub struct GatewayHealth {
    pub state: String,
    pub endpoints: usize,
}

/// Shared application state for health checks
pub struct AppState {
    /// Application start time
    pub started_at: chrono::DateTime<Utc>,
    /// Allocation policy
    pub state: SharedState,
    /// Metrics, for the last processed block
    pub metrics: Arc<MetricsState>,
    /// Gateway selector, for connection state
    pub selector: Arc<EndpointSelector>,
}

/// Health check handler
///
/// GET /health
pub async fn health_check(State(app): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = (Utc::now() - app.started_at).num_seconds();

    let (paused, stake_amount) = {
        let state = app.state.read();
        (state.is_paused(), state.stake_amount())
    };

    let connection = app.selector.state();
    let status = match connection {
        ConnectionState::Connected => HealthStatus::Healthy,
        ConnectionState::Exhausted => HealthStatus::Unhealthy,
        ConnectionState::Disconnected
        | ConnectionState::Connecting
        | ConnectionState::Verifying => HealthStatus::Degraded,
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK, // Still return 200 for degraded
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        uptime_seconds: uptime,
        paused,
        last_block: app.metrics.current_block.get(),
        stake_amount,
        gateway: GatewayHealth {
            state: connection.to_string(),
            endpoints: app.selector.endpoints().len(),
        },
    };

    (status_code, Json(response))
}

/// Simple health check (for load balancers)
///
/// GET /health/live
pub async fn health_simple() -> StatusCode {
    StatusCode::OK
}
