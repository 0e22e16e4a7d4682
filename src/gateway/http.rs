//! JSON-RPC gateway transport
//!
//! Talks JSON-RPC 2.0 over HTTP to a chain bridge that owns the node
//! connection and the wallet keys. Amounts travel as integer rao.

use super::{ChainGateway, GatewayConnector, GatewayError, GatewayResult};
use crate::models::{StakePosition, SubnetSnapshot, Wallet};
use crate::utils::{rao_to_tao, tao_to_rao};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Stake position as reported by the bridge (amount in rao)
#[derive(Debug, Deserialize)]
struct RawStakePosition {
    netuid: u16,
    hotkey_ss58: String,
    #[serde(default)]
    coldkey_ss58: String,
    stake: u64,
}

/// Opens [`HttpGateway`] sessions
pub struct HttpGatewayConnector {
    client: reqwest::Client,
    block_poll_interval: Duration,
}

impl HttpGatewayConnector {
    /// Create a new connector
    pub fn new(request_timeout: Duration, block_poll_interval: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            block_poll_interval,
        }
    }
}

#[async_trait::async_trait]
impl GatewayConnector for HttpGatewayConnector {
    async fn connect(&self, endpoint: &str) -> GatewayResult<Box<dyn ChainGateway>> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| GatewayError::Connection(format!("invalid endpoint {}: {}", endpoint, e)))?;

        Ok(Box::new(HttpGateway {
            endpoint: url.to_string(),
            client: self.client.clone(),
            block_poll_interval: self.block_poll_interval,
            request_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One session against a bridge endpoint
pub struct HttpGateway {
    endpoint: String,
    client: reqwest::Client,
    block_poll_interval: Duration,
    request_id: AtomicU64,
    closed: AtomicBool,
}

impl HttpGateway {
    /// Issue a JSON-RPC call, returning the transport or remote error as text
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, String> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GatewayError::Closed.to_string());
        }

        let payload = json!({
            "jsonrpc": "2.0",
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("{} request failed: {}", method, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{} returned {}: {}", method, status, body));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| format!("{} returned an unreadable body: {}", method, e))?;

        match (body.result, body.error) {
            (_, Some(error)) => Err(format!("{} error {}: {}", method, error.code, error.message)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(format!("{} returned neither result nor error", method)),
        }
    }

    fn query_error(&self, message: String) -> GatewayError {
        if self.closed.load(Ordering::Acquire) {
            GatewayError::Closed
        } else {
            GatewayError::Query(message)
        }
    }
}

#[async_trait::async_trait]
impl ChainGateway for HttpGateway {
    async fn get_current_block(&self) -> GatewayResult<u64> {
        self.call("chain_getBlockNumber", json!([]))
            .await
            .map_err(|e| self.query_error(e))
    }

    async fn all_subnets(&self) -> GatewayResult<Vec<SubnetSnapshot>> {
        self.call("subnet_allSubnets", json!([]))
            .await
            .map_err(|e| self.query_error(e))
    }

    async fn get_stake_for_coldkey(&self, coldkey: &str) -> GatewayResult<Vec<StakePosition>> {
        let raw: Vec<RawStakePosition> = self
            .call("stake_forColdkey", json!([coldkey]))
            .await
            .map_err(|e| self.query_error(e))?;

        Ok(raw
            .into_iter()
            .map(|p| StakePosition {
                netuid: p.netuid,
                hotkey: p.hotkey_ss58,
                coldkey: p.coldkey_ss58,
                stake: rao_to_tao(p.stake),
            })
            .collect())
    }

    async fn get_balance(&self, address: &str) -> GatewayResult<f64> {
        let rao: u64 = self
            .call("balance_get", json!([address]))
            .await
            .map_err(|e| self.query_error(e))?;
        Ok(rao_to_tao(rao))
    }

    async fn add_stake(
        &self,
        wallet: &Wallet,
        hotkey: &str,
        netuid: u16,
        amount: f64,
    ) -> GatewayResult<()> {
        let params = json!({
            "wallet": wallet.name,
            "coldkey_ss58": wallet.coldkey,
            "hotkey_ss58": hotkey,
            "netuid": netuid,
            "amount": tao_to_rao(amount),
            "wait_for_inclusion": false,
            "wait_for_finalization": false,
        });

        let _: Value = self
            .call("stake_add", params)
            .await
            .map_err(GatewayError::Mutation)?;
        Ok(())
    }

    async fn unstake(
        &self,
        wallet: &Wallet,
        hotkey: &str,
        netuid: u16,
        amount: f64,
    ) -> GatewayResult<()> {
        let params = json!({
            "wallet": wallet.name,
            "coldkey_ss58": wallet.coldkey,
            "hotkey_ss58": hotkey,
            "netuid": netuid,
            "amount": tao_to_rao(amount),
            "wait_for_inclusion": false,
            "wait_for_finalization": false,
        });

        let _: Value = self
            .call("stake_remove", params)
            .await
            .map_err(GatewayError::Mutation)?;
        Ok(())
    }

    async fn wait_for_block(&self) -> GatewayResult<u64> {
        let start = self.get_current_block().await?;
        loop {
            tokio::time::sleep(self.block_poll_interval).await;
            let current = self.get_current_block().await?;
            if current > start {
                return Ok(current);
            }
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::trace!(endpoint = %self.endpoint, "Gateway session closed");
        }
    }
}
