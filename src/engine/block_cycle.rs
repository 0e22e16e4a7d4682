//! Block-synchronized allocation cycle
//!
//! Each iteration acquires its own gateway handle, processes the current
//! block, waits for the next one and closes the handle. Any error ends the
//! cycle; the handle is closed first. A block in progress always runs to
//! completion.

use super::allocation::select_best_subnet;
use super::report::{CycleReport, StakeAction};
use crate::error::AppResult;
use crate::gateway::{ChainGateway, EndpointSelector};
use crate::history::SharedHistory;
use crate::metrics::MetricsState;
use crate::models::{PurchaseEvent, Wallet};
use crate::notifications::DigestPublisher;
use crate::state::SharedState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Block cycle driver
pub struct BlockCycle {
    selector: Arc<EndpointSelector>,
    state: SharedState,
    history: SharedHistory,
    digest: DigestPublisher,
    wallet: Wallet,
    /// Hotkey all stake is delegated to
    validator: String,
    metrics: Option<Arc<MetricsState>>,
}

impl BlockCycle {
    pub fn new(
        selector: Arc<EndpointSelector>,
        state: SharedState,
        history: SharedHistory,
        digest: DigestPublisher,
        wallet: Wallet,
        validator: String,
    ) -> Self {
        Self {
            selector,
            state,
            history,
            digest,
            wallet,
            validator,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsState>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run until an iteration fails or `cancel_token` is cancelled.
    /// Cancellation is honoured between blocks and while waiting for the
    /// next block, never while a block is being processed.
    pub async fn run(&self, cancel_token: CancellationToken) -> AppResult<()> {
        while !cancel_token.is_cancelled() {
            if let Err(e) = self.step(Some(&cancel_token)).await {
                tracing::error!(error = %e, "Error in block cycle, stopping");
                return Err(e);
            }
        }
        tracing::info!("Block cycle stopped");
        Ok(())
    }

    /// One iteration: acquire, process, wait for the next block, close
    pub async fn iterate(&self) -> AppResult<CycleReport> {
        self.step(None).await
    }

    async fn step(&self, cancel_token: Option<&CancellationToken>) -> AppResult<CycleReport> {
        let gateway = self.selector.acquire().await?;

        let result = match self.process_block(gateway.as_ref()).await {
            Ok(report) => match cancel_token {
                Some(token) => tokio::select! {
                    waited = gateway.wait_for_block() => waited.map(|_| report).map_err(Into::into),
                    _ = token.cancelled() => Ok(report),
                },
                None => gateway
                    .wait_for_block()
                    .await
                    .map(|_| report)
                    .map_err(Into::into),
            },
            Err(e) => Err(e),
        };

        gateway.close().await;
        result
    }

    /// Score, allocate, refresh positions, report and publish for the
    /// current block
    pub async fn process_block(&self, gateway: &dyn ChainGateway) -> AppResult<CycleReport> {
        let started = Instant::now();

        let block = gateway.get_current_block().await?;
        let subnets = gateway.all_subnets().await?;

        // Commands handled during the queries above apply from here on
        let policy = self.state.read().snapshot();
        let selection = select_best_subnet(&subnets, &policy.exclusions, &policy.preferences);

        let action = match selection.subnet {
            _ if policy.paused => StakeAction::Paused,
            None => StakeAction::None,
            Some(chosen) => {
                let multiplier = policy.preference(chosen.netuid);
                let amount = policy.stake_amount * multiplier;

                match gateway
                    .add_stake(&self.wallet, &self.validator, chosen.netuid, amount)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(
                            block = block,
                            netuid = chosen.netuid,
                            amount = amount,
                            score = selection.score,
                            multiplier = multiplier,
                            "Stake allocated"
                        );
                        self.history.lock().record_purchase(PurchaseEvent {
                            block,
                            netuid: chosen.netuid,
                            subnet_name: chosen.name.clone(),
                            stake_amount: amount,
                            score: selection.score,
                            pref_multiplier: multiplier,
                        });
                        if let Some(metrics) = &self.metrics {
                            metrics.allocations_total.inc();
                            metrics.staked_tao_total.inc_by(amount);
                        }
                        StakeAction::Staked {
                            amount,
                            score: selection.score,
                            multiplier,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            block = block,
                            netuid = chosen.netuid,
                            amount = amount,
                            error = %e,
                            "Stake allocation failed"
                        );
                        if let Some(metrics) = &self.metrics {
                            metrics.allocation_failures_total.inc();
                        }
                        StakeAction::Failed(e.to_string())
                    }
                }
            }
        };

        let own_stakes = self.own_stakes(gateway).await?;
        let wallet_balance = gateway.get_balance(&self.wallet.coldkey).await?;

        let report = CycleReport::build(
            block,
            &subnets,
            &own_stakes,
            &policy,
            selection.netuid(),
            action,
            wallet_balance,
        );

        tracing::info!(
            block = block,
            chosen = ?report.chosen,
            action = %report.action,
            summary = %report.summary(),
            "Block processed"
        );
        tracing::debug!(block = block, "Subnet overview\n{}", report.render_table());

        if let Some(metrics) = &self.metrics {
            metrics.blocks_processed.inc();
            metrics.current_block.set(block as i64);
            metrics.paused.set(policy.paused as i64);
            metrics
                .cycle_latency
                .observe(started.elapsed().as_secs_f64() * 1000.0);
        }

        self.digest.maybe_publish(block, &report.summary()).await;

        Ok(report)
    }

    /// Stake per subnet delegated to the configured validator
    async fn own_stakes(&self, gateway: &dyn ChainGateway) -> AppResult<HashMap<u16, f64>> {
        let positions = gateway.get_stake_for_coldkey(&self.wallet.coldkey).await?;

        let mut stakes = HashMap::new();
        for position in positions.into_iter().filter(|p| p.hotkey == self.validator) {
            *stakes.entry(position.netuid).or_insert(0.0) += position.stake;
        }
        Ok(stakes)
    }
}
