//! Prometheus metrics for the staking agent
//!
//! Exposes metrics endpoint for monitoring:
//! - Block cycle progress (blocks processed, current height, cycle latency)
//! - Allocation outcomes and staked volume
//! - Control command counts by verb
//! - Gateway connection failures by endpoint
//! - Digest delivery and pause state

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Counter, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics state
pub struct MetricsState {
    /// Prometheus registry
    registry: Registry,
    /// Blocks the block cycle finished processing
    pub blocks_processed: IntCounter,
    /// Last block height observed by the block cycle
    pub current_block: IntGauge,
    /// Block processing latency (in milliseconds)
    pub cycle_latency: Histogram,
    /// Successful automatic allocations
    pub allocations_total: IntCounter,
    /// Rejected automatic allocations
    pub allocation_failures_total: IntCounter,
    /// TAO staked by automatic allocations
    pub staked_tao_total: Counter,
    /// Control commands handled, by verb
    pub commands_total: IntCounterVec,
    /// Failed connect or verify attempts, by endpoint
    pub gateway_connect_failures: IntCounterVec,
    /// Digests delivered
    pub digests_sent: IntCounter,
    /// Digests that failed to send
    pub digests_failed: IntCounter,
    /// Pause flag (1 = paused, 0 = allocating)
    pub paused: IntGauge,
}

fn register<T: prometheus::core::Collector + Clone + 'static>(registry: &Registry, metric: T) -> T {
    registry
        .register(Box::new(metric.clone()))
        .expect("Failed to register metric");
    metric
}

impl MetricsState {
    /// Create a new metrics state with all metrics registered
    pub fn new() -> Self {
        let registry = Registry::new();

        let blocks_processed = register(
            &registry,
            IntCounter::with_opts(Opts::new(
                "staker_blocks_processed_total",
                "Total number of blocks processed by the block cycle",
            ))
            .expect("Failed to create blocks_processed counter"),
        );

        let current_block = register(
            &registry,
            IntGauge::with_opts(Opts::new(
                "staker_current_block",
                "Last block height observed",
            ))
            .expect("Failed to create current_block gauge"),
        );

        let cycle_latency = register(
            &registry,
            Histogram::with_opts(HistogramOpts::new(
                "staker_cycle_latency_ms",
                "Block processing latency in milliseconds",
            ))
            .expect("Failed to create cycle_latency histogram"),
        );

        let allocations_total = register(
            &registry,
            IntCounter::with_opts(Opts::new(
                "staker_allocations_total",
                "Total number of successful allocations",
            ))
            .expect("Failed to create allocations_total counter"),
        );

        let allocation_failures_total = register(
            &registry,
            IntCounter::with_opts(Opts::new(
                "staker_allocation_failures_total",
                "Total number of rejected allocations",
            ))
            .expect("Failed to create allocation_failures_total counter"),
        );

        let staked_tao_total = register(
            &registry,
            Counter::with_opts(Opts::new(
                "staker_staked_tao_total",
                "TAO staked by automatic allocations",
            ))
            .expect("Failed to create staked_tao_total counter"),
        );

        let commands_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("staker_commands_total", "Control commands handled"),
                &["command"],
            )
            .expect("Failed to create commands_total counter"),
        );

        let gateway_connect_failures = register(
            &registry,
            IntCounterVec::new(
                Opts::new(
                    "staker_gateway_connect_failures_total",
                    "Failed gateway connect or verify attempts",
                ),
                &["endpoint"],
            )
            .expect("Failed to create gateway_connect_failures counter"),
        );

        let digests_sent = register(
            &registry,
            IntCounter::with_opts(Opts::new(
                "staker_digests_sent_total",
                "Total number of digests delivered",
            ))
            .expect("Failed to create digests_sent counter"),
        );

        let digests_failed = register(
            &registry,
            IntCounter::with_opts(Opts::new(
                "staker_digests_failed_total",
                "Total number of digests that failed to send",
            ))
            .expect("Failed to create digests_failed counter"),
        );

        let paused = register(
            &registry,
            IntGauge::with_opts(Opts::new(
                "staker_paused",
                "Allocation pause flag (1 = paused, 0 = allocating)",
            ))
            .expect("Failed to create paused gauge"),
        );

        Self {
            registry,
            blocks_processed,
            current_block,
            cycle_latency,
            allocations_total,
            allocation_failures_total,
            staked_tao_total,
            commands_total,
            gateway_connect_failures,
            digests_sent,
            digests_failed,
            paused,
        }
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics handler - returns Prometheus metrics in text format
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry().gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("Content-Type", "text/plain; version=0.0.4")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        buffer,
    )
}

/// Create metrics router
pub fn metrics_router() -> Router<Arc<MetricsState>> {
    Router::new().route("/metrics", get(metrics_handler))
}
