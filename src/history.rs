//! Purchase history and point-in-time PnL tracking
//!
//! Every successful allocation is appended to two independent buffers:
//! - the batch buffer, drained by the digest publisher on its block cadence
//! - the accumulated buffer, drained only by a `/history` checkpoint
//!
//! A checkpoint compares the current portfolio against the previous
//! snapshot and then replaces it. Stake on both sides is valued at the
//! prices observed at checkpoint time.

use crate::constants::network::NATIVE_SYMBOL;
use crate::models::{PurchaseEvent, StakePosition, SubnetSnapshot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Shared handle to the history tracker
pub type SharedHistory = Arc<Mutex<HistoryTracker>>;

/// Portfolio state captured by a `/history` checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub taken_at: DateTime<Utc>,
    pub block: u64,
    pub wallet_balance: f64,
    /// Stake value at the prices seen when the snapshot was taken
    pub stake_value: f64,
    /// Subnets with nonzero stake
    pub stakes: BTreeMap<u16, f64>,
}

/// Raw chain data gathered for a checkpoint
#[derive(Debug, Clone)]
pub struct PortfolioObservation {
    pub observed_at: DateTime<Utc>,
    pub block: u64,
    pub wallet_balance: f64,
    pub subnets: Vec<SubnetSnapshot>,
    pub positions: Vec<StakePosition>,
}

/// Price and name of a non-root subnet
#[derive(Debug, Clone)]
struct SubnetQuote {
    price: f64,
    name: String,
}

impl PortfolioObservation {
    fn quotes(&self) -> HashMap<u16, SubnetQuote> {
        self.subnets
            .iter()
            .filter(|s| !s.is_root())
            .map(|s| {
                (
                    s.netuid,
                    SubnetQuote {
                        price: s.price,
                        name: s.name.clone(),
                    },
                )
            })
            .collect()
    }

    /// Stake per subnet summed across hotkeys, zero entries dropped
    fn stakes(&self) -> BTreeMap<u16, f64> {
        let mut stakes = BTreeMap::new();
        for position in &self.positions {
            *stakes.entry(position.netuid).or_insert(0.0) += position.stake;
        }
        stakes.retain(|_, amount| *amount != 0.0);
        stakes
    }
}

fn stake_value(stakes: &BTreeMap<u16, f64>, quotes: &HashMap<u16, SubnetQuote>) -> f64 {
    stakes
        .iter()
        .map(|(netuid, amount)| amount * quotes.get(netuid).map_or(0.0, |q| q.price))
        .fold(0.0, |acc, value| acc + value)
}

/// Sum that is `0.0` (not `-0.0`) when empty
fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, value| acc + value)
}

/// Positive stake change on one subnet
#[derive(Debug, Clone, PartialEq)]
pub struct StakeIncrease {
    pub netuid: u16,
    pub name: String,
    pub amount: f64,
}

/// Comparison between two checkpoints
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryReport {
    pub elapsed_secs: f64,
    pub blocks: i64,
    /// Sum of allocations since the previous checkpoint
    pub amount_staked: f64,
    /// Change in total raw stake quantity
    pub stake_change: f64,
    pub pnl: f64,
    pub increases: Vec<StakeIncrease>,
}

impl fmt::Display for HistoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*History Summary:*")?;
        writeln!(f, "Time: {:.2} seconds", self.elapsed_secs)?;
        writeln!(f, "Blocks: {}", self.blocks)?;
        writeln!(f, "Amount Staked: {:.4} {}", self.amount_staked, NATIVE_SYMBOL)?;
        writeln!(f, "Total Stake Added: {:.4} {}", self.stake_change, NATIVE_SYMBOL)?;
        writeln!(f, "PNL: {:.4} {}", self.pnl, NATIVE_SYMBOL)?;
        write!(f, "Increase:")?;
        if self.increases.is_empty() {
            write!(f, "\nNone")
        } else {
            for increase in &self.increases {
                write!(
                    f,
                    "\n     {} ({}): +{:.4}",
                    increase.netuid, increase.name, increase.amount
                )?;
            }
            Ok(())
        }
    }
}

/// Result of a checkpoint
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    /// First checkpoint, nothing to compare against
    Baseline,
    Report(HistoryReport),
}

impl HistoryOutcome {
    /// Control channel reply
    pub fn reply(&self) -> String {
        match self {
            HistoryOutcome::Baseline => {
                "History snapshot created. No previous history available.".to_string()
            }
            HistoryOutcome::Report(report) => report.to_string(),
        }
    }
}

/// Owner of the purchase buffers and the last snapshot
#[derive(Debug, Default)]
pub struct HistoryTracker {
    batch: Vec<PurchaseEvent>,
    accumulated: Vec<PurchaseEvent>,
    last_snapshot: Option<HistorySnapshot>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a [`SharedHistory`]
    pub fn shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    /// Append a successful allocation to both buffers
    pub fn record_purchase(&mut self, event: PurchaseEvent) {
        self.accumulated.push(event.clone());
        self.batch.push(event);
    }

    pub fn batch(&self) -> &[PurchaseEvent] {
        &self.batch
    }

    /// Drain the batch buffer
    pub fn take_batch(&mut self) -> Vec<PurchaseEvent> {
        std::mem::take(&mut self.batch)
    }

    pub fn accumulated(&self) -> &[PurchaseEvent] {
        &self.accumulated
    }

    pub fn last_snapshot(&self) -> Option<&HistorySnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Compare `observation` with the previous snapshot, then make it the
    /// new snapshot and drain the accumulated buffer. The first checkpoint
    /// only records the baseline and keeps the buffer.
    pub fn checkpoint(&mut self, observation: PortfolioObservation) -> HistoryOutcome {
        let quotes = observation.quotes();
        let stakes = observation.stakes();
        let current = HistorySnapshot {
            taken_at: observation.observed_at,
            block: observation.block,
            wallet_balance: observation.wallet_balance,
            stake_value: stake_value(&stakes, &quotes),
            stakes,
        };

        let previous = match self.last_snapshot.replace(current.clone()) {
            Some(previous) => previous,
            None => return HistoryOutcome::Baseline,
        };

        let amount_staked = total(self.accumulated.iter().map(|e| e.stake_amount));
        self.accumulated.clear();

        let previous_total = total(previous.stakes.values().copied());
        let current_total = total(current.stakes.values().copied());

        let previous_value = previous.wallet_balance + stake_value(&previous.stakes, &quotes);
        let current_value = current.wallet_balance + current.stake_value;

        let increases = current
            .stakes
            .iter()
            .filter_map(|(netuid, amount)| {
                let diff = amount - previous.stakes.get(netuid).copied().unwrap_or(0.0);
                (diff > 0.0).then(|| StakeIncrease {
                    netuid: *netuid,
                    name: quotes.get(netuid).map(|q| q.name.clone()).unwrap_or_default(),
                    amount: diff,
                })
            })
            .collect();

        HistoryOutcome::Report(HistoryReport {
            elapsed_secs: (current.taken_at - previous.taken_at).num_milliseconds() as f64
                / 1000.0,
            blocks: current.block as i64 - previous.block as i64,
            amount_staked,
            stake_change: current_total - previous_total,
            pnl: current_value - previous_value,
            increases,
        })
    }
}
