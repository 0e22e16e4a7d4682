//! Error types for the subnet staker

use crate::gateway::GatewayError;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Chain gateway error (connection, query or mutation)
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Configuration loaded but rejected by validation
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
