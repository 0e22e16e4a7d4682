//! Purchase events recorded for every successful allocation

use serde::Serialize;

/// One successful stake allocation made by the block cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseEvent {
    /// Block the allocation was made at
    pub block: u64,
    pub netuid: u16,
    pub subnet_name: String,
    /// Amount staked in TAO
    pub stake_amount: f64,
    /// Effective score at selection time
    pub score: f64,
    /// Preference multiplier applied to score and amount
    pub pref_multiplier: f64,
}

impl PurchaseEvent {
    /// Markdown line used in the periodic digest
    pub fn digest_line(&self) -> String {
        format!(
            "- Block `{}`: Subnet `{}` (_{}_) staked `{:.4}` TAO (score: `{:.4}`, mult: `{:.2}`)",
            self.block, self.netuid, self.subnet_name, self.stake_amount, self.score, self.pref_multiplier
        )
    }
}
