//! Subnet Staker Library
//!
//! Block-synchronized stake allocation across subnets, steered at runtime
//! over a Telegram control channel.
//! This library exposes core modules for the binary and for testing.

pub mod config;
pub mod constants;
pub mod control;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod history;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod state;
pub mod utils;

// Re-export commonly used types for tests
pub use config::AppConfig;
pub use control::{Command, CommandError, CommandInterpreter, ControlLoop};
pub use engine::{select_best_subnet, BlockCycle, CycleReport, StakeAction};
pub use error::{AppError, AppResult};
pub use gateway::{
    ChainGateway, ConnectionState, EndpointSelector, GatewayConnector, GatewayError, RetryPolicy,
};
pub use history::{HistoryOutcome, HistoryTracker, SharedHistory};
pub use metrics::MetricsState;
pub use models::{PurchaseEvent, StakePosition, SubnetSnapshot, Wallet};
pub use notifications::{DigestPublisher, InboundMessage, MessagingService};
pub use orchestrator::Orchestrator;
pub use state::{OperatingState, PolicySnapshot, SharedState};
