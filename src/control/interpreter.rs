//! Command interpreter
//!
//! Applies one control command and produces the reply text. Local commands
//! mutate the shared state directly; chain commands acquire their own
//! gateway handle and close it before replying.

use super::command::Command;
use crate::constants::network::NATIVE_SYMBOL;
use crate::gateway::{ChainGateway, EndpointSelector, GatewayResult};
use crate::history::{PortfolioObservation, SharedHistory};
use crate::metrics::MetricsState;
use crate::models::{SubnetSnapshot, Wallet};
use crate::state::SharedState;
use chrono::Utc;
use std::sync::Arc;

async fn subnet_data(gateway: &dyn ChainGateway) -> GatewayResult<(u64, Vec<SubnetSnapshot>)> {
    Ok((gateway.get_current_block().await?, gateway.all_subnets().await?))
}

/// Interprets control commands against the shared state and the chain
pub struct CommandInterpreter {
    selector: Arc<EndpointSelector>,
    state: SharedState,
    history: SharedHistory,
    wallet: Wallet,
    /// Hotkey used for manual stake and unstake
    validator: String,
    metrics: Option<Arc<MetricsState>>,
}

impl CommandInterpreter {
    pub fn new(
        selector: Arc<EndpointSelector>,
        state: SharedState,
        history: SharedHistory,
        wallet: Wallet,
        validator: String,
    ) -> Self {
        Self {
            selector,
            state,
            history,
            wallet,
            validator,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsState>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Parse and apply `text`, returning the reply
    pub async fn handle(&self, text: &str) -> String {
        let command = match text.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(text = %text, error = %e, "Rejected control message");
                return e.to_string();
            }
        };

        tracing::info!(
            command = command.verb(),
            remote = command.needs_gateway(),
            "Handling control command"
        );
        if let Some(metrics) = &self.metrics {
            metrics
                .commands_total
                .with_label_values(&[command.verb()])
                .inc();
        }

        self.execute(command).await
    }

    /// Apply a parsed command
    pub async fn execute(&self, command: Command) -> String {
        if let Some(reply) = self.apply_local(command) {
            return reply;
        }

        let gateway = match self.selector.acquire().await {
            Ok(gateway) => gateway,
            Err(e) => return format!("Error initializing gateway connection: {}", e),
        };

        let reply = self.apply_remote(gateway.as_ref(), command).await;
        gateway.close().await;
        reply
    }

    /// Commands that only touch the shared state
    fn apply_local(&self, command: Command) -> Option<String> {
        let reply = match command {
            Command::Pause => {
                self.set_paused(true);
                "Bot is now paused. No new staking actions will be performed.".to_string()
            }
            Command::Start => {
                self.set_paused(false);
                "Bot has resumed staking.".to_string()
            }
            Command::Boost(netuid) => {
                let updated = self.state.write().boost(netuid);
                format!("New preference for subnet {} is: `{:.2}`", netuid, updated)
            }
            Command::Slash(netuid) => {
                let updated = self.state.write().slash(netuid);
                format!("New preference for subnet {} is: `{:.2}`", netuid, updated)
            }
            Command::Exclude(netuid) => {
                if self.state.write().exclude(netuid) {
                    format!("Subnet {} has been added to the exclude list.", netuid)
                } else {
                    format!("Subnet {} is already in the exclude list.", netuid)
                }
            }
            Command::Amount(amount) => {
                self.state.write().set_stake_amount(amount);
                format!("New stake amount is: `{:.4}` {}", amount, NATIVE_SYMBOL)
            }
            _ => return None,
        };
        Some(reply)
    }

    /// Commands that need a gateway handle
    async fn apply_remote(&self, gateway: &dyn ChainGateway, command: Command) -> String {
        match command {
            Command::Balance => self
                .balance(gateway)
                .await
                .unwrap_or_else(|e| format!("Error retrieving balance info: {}", e)),
            Command::History => self.history(gateway).await,
            Command::Info(netuid) => self.info(gateway, netuid).await,
            Command::Unstake { netuid, amount } => {
                match gateway
                    .unstake(&self.wallet, &self.validator, netuid, amount)
                    .await
                {
                    Ok(()) => format!("Unstaked {:.4} from subnet {}.", amount, netuid),
                    Err(e) => format!("Error unstaking from subnet {}: {}", netuid, e),
                }
            }
            Command::Stake { netuid, amount } => {
                match gateway
                    .add_stake(&self.wallet, &self.validator, netuid, amount)
                    .await
                {
                    Ok(()) => format!(
                        "Staked {:.4} {} in subnet {}.",
                        amount, NATIVE_SYMBOL, netuid
                    ),
                    Err(e) => format!("Error staking in subnet {}: {}", netuid, e),
                }
            }
            local => self.apply_local(local).unwrap_or_default(),
        }
    }

    fn set_paused(&self, paused: bool) {
        self.state.write().set_paused(paused);
        if let Some(metrics) = &self.metrics {
            metrics.paused.set(paused as i64);
        }
    }

    async fn balance(&self, gateway: &dyn ChainGateway) -> GatewayResult<String> {
        let block = gateway.get_current_block().await?;
        let positions = gateway.get_stake_for_coldkey(&self.wallet.coldkey).await?;
        let balance = gateway.get_balance(&self.wallet.coldkey).await?;

        let mut lines = vec![
            "*Portfolio Balance Info:*".to_string(),
            format!("• Wallet Balance: `{:.4}` {}", balance, NATIVE_SYMBOL),
            format!("• Current Block: `{}`", block),
            String::new(),
        ];

        if positions.is_empty() {
            lines.push("No stakes found.".to_string());
        } else {
            lines.push("*Staked Amounts by Subnet:*".to_string());
            lines.extend(
                positions
                    .iter()
                    .filter(|p| p.stake > 0.0)
                    .map(|p| format!("• Subnet `{}`: `{:.4}`", p.netuid, p.stake)),
            );
        }

        Ok(lines.join("\n"))
    }

    async fn history(&self, gateway: &dyn ChainGateway) -> String {
        let observation = match self.observe(gateway).await {
            Ok(observation) => observation,
            Err(e) => return format!("Error retrieving portfolio info: {}", e),
        };

        self.history.lock().checkpoint(observation).reply()
    }

    async fn observe(&self, gateway: &dyn ChainGateway) -> GatewayResult<PortfolioObservation> {
        let block = gateway.get_current_block().await?;
        let subnets = gateway.all_subnets().await?;
        let positions = gateway.get_stake_for_coldkey(&self.wallet.coldkey).await?;
        let wallet_balance = gateway.get_balance(&self.wallet.coldkey).await?;

        Ok(PortfolioObservation {
            observed_at: Utc::now(),
            block,
            wallet_balance,
            subnets,
            positions,
        })
    }

    async fn info(&self, gateway: &dyn ChainGateway, netuid: u16) -> String {
        let (block, subnets) = match subnet_data(gateway).await {
            Ok(data) => data,
            Err(e) => return format!("Error retrieving subnet data: {}", e),
        };

        let target = match subnets.into_iter().find(|s| s.netuid == netuid) {
            Some(target) => target,
            None => return format!("Subnet {} not found.", netuid),
        };

        let positions = match gateway.get_stake_for_coldkey(&self.wallet.coldkey).await {
            Ok(positions) => positions,
            Err(e) => return format!("Error retrieving stake info: {}", e),
        };

        let own_stake = positions
            .iter()
            .find(|p| p.netuid == netuid && p.hotkey == self.validator)
            .map_or(0.0, |p| p.stake);
        let preference = self.state.read().preference(netuid);

        format!(
            "*Subnet Info for {} ({}):*\n\
             • *Current Price:* `{:.4}` {}\n\
             • *Your Stake:* `{:.4}` {}\n\
             • *Current Preference:* `{:.2}`\n\
             • *Current Block:* `{}`",
            netuid,
            target.name,
            target.price,
            NATIVE_SYMBOL,
            own_stake,
            target.symbol,
            preference,
            block
        )
    }
}
