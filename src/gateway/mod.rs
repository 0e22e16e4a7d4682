//! Chain gateway
//!
//! The engine and the control channel only talk to the chain through the
//! [`ChainGateway`] capability. Handles are opened by a [`GatewayConnector`]
//! and verified by the [`EndpointSelector`], which fails over across the
//! configured endpoints.
//!
//! Handles are owned by the task that acquired them and must be closed on
//! every exit path.

pub mod http;
mod retry;
mod selector;

pub use http::{HttpGateway, HttpGatewayConnector};
pub use retry::RetryPolicy;
pub use selector::{ConnectionState, EndpointSelector};

use crate::models::{StakePosition, SubnetSnapshot, Wallet};
use thiserror::Error;

/// Gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Endpoint unreachable or session could not be opened
    #[error("connection failed: {0}")]
    Connection(String),

    /// A read call failed
    #[error("query failed: {0}")]
    Query(String),

    /// A stake or unstake call failed
    #[error("mutation failed: {0}")]
    Mutation(String),

    /// Call issued on a handle that was already closed
    #[error("gateway handle is closed")]
    Closed,

    /// Selector was built without endpoints
    #[error("no gateway endpoints configured")]
    NoEndpoints,

    /// Every endpoint failed every attempt
    #[error("failed to connect to any endpoint after {attempts} attempts; last error: {source}")]
    ConnectionExhausted {
        attempts: u32,
        source: Box<GatewayError>,
    },
}

/// Result type alias for gateway calls
pub type GatewayResult<T> = Result<T, GatewayError>;

/// One live session with the chain
#[async_trait::async_trait]
pub trait ChainGateway: Send + Sync {
    /// Current block height
    async fn get_current_block(&self) -> GatewayResult<u64>;

    /// All subnets, in chain order
    async fn all_subnets(&self) -> GatewayResult<Vec<SubnetSnapshot>>;

    /// Every stake position held by a coldkey
    async fn get_stake_for_coldkey(&self, coldkey: &str) -> GatewayResult<Vec<StakePosition>>;

    /// Free balance of an address, in TAO
    async fn get_balance(&self, address: &str) -> GatewayResult<f64>;

    /// Stake `amount` TAO on `netuid` through `hotkey`
    async fn add_stake(
        &self,
        wallet: &Wallet,
        hotkey: &str,
        netuid: u16,
        amount: f64,
    ) -> GatewayResult<()>;

    /// Unstake `amount` from `netuid` through `hotkey`
    async fn unstake(
        &self,
        wallet: &Wallet,
        hotkey: &str,
        netuid: u16,
        amount: f64,
    ) -> GatewayResult<()>;

    /// Suspend until a block newer than the current one is observed
    async fn wait_for_block(&self) -> GatewayResult<u64>;

    /// Release the session
    async fn close(&self);
}

/// Opens (initializes) sessions against a single endpoint
#[async_trait::async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> GatewayResult<Box<dyn ChainGateway>>;
}
