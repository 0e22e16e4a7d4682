//! HTTP handlers for the subnet staker

mod health;

pub use health::*;

use crate::metrics::{metrics_router, MetricsState};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Health and metrics routes
pub fn router(app_state: Arc<AppState>, metrics: Arc<MetricsState>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(health_simple))
        .with_state(app_state);

    let metrics_routes = metrics_router().with_state(metrics);

    Router::new()
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
}
