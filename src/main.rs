//! Subnet Staker - block-synchronized stake allocation agent
//!
//! This is the main entry point. It wires the gateway, the shared state, the
//! messaging channel and the optional health/metrics server, then runs the
//! orchestrator until the block cycle fails or ctrl-c is received.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subnet_staker::config::AppConfig;
use subnet_staker::control::{CommandInterpreter, ControlLoop};
use subnet_staker::engine::BlockCycle;
use subnet_staker::gateway::{EndpointSelector, HttpGatewayConnector, RetryPolicy};
use subnet_staker::handlers::{self, AppState};
use subnet_staker::history::HistoryTracker;
use subnet_staker::metrics::MetricsState;
use subnet_staker::notifications::{
    DigestPublisher, DisabledMessaging, MessagingService, TelegramClient,
};
use subnet_staker::orchestrator::Orchestrator;
use subnet_staker::state::OperatingState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting Subnet Staker v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    tracing::info!(
        wallet = %config.wallet.name,
        validator = %config.validator,
        stake_amount = config.stake_amount,
        endpoints = config.gateway.endpoints.len(),
        telegram = config.telegram.is_enabled(),
        "Configuration loaded"
    );

    let metrics = Arc::new(MetricsState::new());

    // Shared operating state and history
    let state = OperatingState::new(
        config.preference_map()?,
        config.exclusion_set(),
        config.stake_amount,
        config.paused,
    )
    .shared();
    metrics.paused.set(config.paused as i64);
    let history = HistoryTracker::new().shared();

    // Gateway failover
    let connector = Arc::new(HttpGatewayConnector::new(
        Duration::from_millis(config.gateway.request_timeout_ms),
        Duration::from_millis(config.gateway.block_poll_interval_ms),
    ));
    let policy = RetryPolicy::new(
        config.gateway.max_attempts,
        Duration::from_secs(config.gateway.backoff_min_secs),
        Duration::from_secs(config.gateway.backoff_max_secs),
    );
    let selector = Arc::new(
        EndpointSelector::new(config.gateway.endpoints.clone(), connector, policy)
            .with_metrics(metrics.clone()),
    );

    // Messaging channel
    let messaging: Arc<dyn MessagingService> = if config.telegram.is_enabled() {
        Arc::new(TelegramClient::new(&config.telegram))
    } else {
        tracing::warn!("Telegram token or chat id missing, messaging disabled");
        Arc::new(DisabledMessaging)
    };

    let digest = DigestPublisher::new(
        messaging.clone(),
        history.clone(),
        config.telegram.update_interval,
    )
    .with_metrics(metrics.clone());

    let block_cycle = BlockCycle::new(
        selector.clone(),
        state.clone(),
        history.clone(),
        digest,
        config.wallet(),
        config.validator.clone(),
    )
    .with_metrics(metrics.clone());

    let control = if messaging.is_enabled() {
        let interpreter = CommandInterpreter::new(
            selector.clone(),
            state.clone(),
            history.clone(),
            config.wallet(),
            config.validator.clone(),
        )
        .with_metrics(metrics.clone());
        Some(ControlLoop::new(
            messaging.clone(),
            interpreter,
            config.telegram.poll_interval(),
        ))
    } else {
        None
    };

    let cancel_token = CancellationToken::new();

    // Health and metrics server
    if config.server.enabled {
        let app_state = Arc::new(AppState {
            started_at: chrono::Utc::now(),
            state: state.clone(),
            metrics: metrics.clone(),
            selector: selector.clone(),
        });
        let app = handlers::router(app_state, metrics.clone());

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Health server listening");

        let shutdown = cancel_token.clone();
        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Health server failed");
            }
        });
    }

    // Ctrl-c handler
    let shutdown = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received ctrl-c, shutting down");
                shutdown.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for ctrl-c"),
        }
    });

    let result = Orchestrator::new(block_cycle, control)
        .run(cancel_token.clone())
        .await;
    cancel_token.cancel();

    result?;
    tracing::info!("Subnet Staker stopped");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subnet_staker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load and validate configuration
fn load_config() -> anyhow::Result<AppConfig> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    config.validate()?;

    Ok(config)
}
