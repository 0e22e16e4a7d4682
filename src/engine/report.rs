//! Per-block display model
//!
//! One row per allocatable subnet plus a one-line wallet summary. The summary
//! is logged every block and reused as the digest summary; the table is only
//! rendered at debug level.

use crate::constants::network::NATIVE_SYMBOL;
use crate::models::SubnetSnapshot;
use crate::state::PolicySnapshot;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

/// What the block cycle did with the selected subnet
#[derive(Debug, Clone, PartialEq)]
pub enum StakeAction {
    /// No subnet scored above zero
    None,
    /// Allocation skipped while paused
    Paused,
    Staked {
        amount: f64,
        score: f64,
        multiplier: f64,
    },
    /// The stake call was rejected
    Failed(String),
}

impl fmt::Display for StakeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeAction::None => Ok(()),
            StakeAction::Paused => write!(f, "Paused"),
            StakeAction::Staked {
                amount,
                score,
                multiplier,
            } => write!(
                f,
                "Stake: {:.4} {} (score: {:.4}, mult: {:.2})",
                amount, NATIVE_SYMBOL, score, multiplier
            ),
            StakeAction::Failed(error) => write!(f, "Stake error: {}", error),
        }
    }
}

/// One subnet row
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub netuid: u16,
    pub name: String,
    pub price: f64,
    pub emission: f64,
    /// Raw score, before the preference multiplier
    pub score: f64,
    pub multiplier: f64,
    /// Own stake through the configured validator
    pub stake: f64,
    pub action: String,
}

/// Everything shown for one processed block
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub block: u64,
    pub chosen: Option<u16>,
    pub action: StakeAction,
    pub rows: Vec<ReportRow>,
    pub wallet_balance: f64,
    pub total_price: f64,
    pub total_stake: f64,
    pub total_stake_value: f64,
}

impl CycleReport {
    /// Build the report. Root and non-positive price subnets get no row.
    pub fn build(
        block: u64,
        subnets: &[SubnetSnapshot],
        own_stakes: &HashMap<u16, f64>,
        policy: &PolicySnapshot,
        chosen: Option<u16>,
        action: StakeAction,
        wallet_balance: f64,
    ) -> Self {
        let mut rows = Vec::new();
        let mut total_price = 0.0;
        let mut total_stake = 0.0;
        let mut total_stake_value = 0.0;

        for subnet in subnets.iter().filter(|s| !s.is_root()) {
            let score = match subnet.raw_score() {
                Some(score) => score,
                None => continue,
            };
            let stake = own_stakes.get(&subnet.netuid).copied().unwrap_or(0.0);

            total_price += subnet.price;
            total_stake += stake;
            total_stake_value += stake * subnet.price;

            let row_action = if policy.exclusions.contains(&subnet.netuid) {
                "Excluded".to_string()
            } else if chosen == Some(subnet.netuid) {
                action.to_string()
            } else {
                String::new()
            };

            rows.push(ReportRow {
                netuid: subnet.netuid,
                name: subnet.name.clone(),
                price: subnet.price,
                emission: subnet.emission,
                score,
                multiplier: policy.preference(subnet.netuid),
                stake,
                action: row_action,
            });
        }

        Self {
            block,
            chosen,
            action,
            rows,
            wallet_balance,
            total_price,
            total_stake,
            total_stake_value,
        }
    }

    /// Wallet summary line
    pub fn summary(&self) -> String {
        format!(
            "Wallet Balance: {:.4} {sym} | Total Subnet Prices: {:.4} | Total Stake: {:.4} | Total Stake Value: {:.4} {sym}",
            self.wallet_balance,
            self.total_price,
            self.total_stake,
            self.total_stake_value,
            sym = NATIVE_SYMBOL
        )
    }

    /// Plain-text subnet table
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>6}  {:<20}  {:>10}  {:>10}  {:>10}  {:>9}  {:>10}  Action",
            "Subnet", "Name", "Price", "Emission", "Score", "Pref Mult", "Stake"
        );
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:>6}  {:<20}  {:>10.4}  {:>10.4}  {:>10.4}  {:>9.2}  {:>10.4}  {}",
                row.netuid,
                row.name,
                row.price,
                row.emission,
                row.score,
                row.multiplier,
                row.stake,
                row.action
            );
        }
        out
    }
}
