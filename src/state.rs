//! Shared operating state
//!
//! The single source of truth for allocation policy: preference multipliers,
//! the exclusion set, the base stake unit and the pause flag. Mutated only by
//! the command interpreter, read by the block cycle and the health endpoint.
//!
//! Callers never hold the lock across an await; the block cycle works from a
//! [`PolicySnapshot`] taken at the step that needs it.

use crate::constants::preference::{DEFAULT_MULTIPLIER, MIN_MULTIPLIER, STEP};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Shared handle to the operating state
pub type SharedState = Arc<RwLock<OperatingState>>;

/// Allocation policy
#[derive(Debug, Clone)]
pub struct OperatingState {
    preferences: HashMap<u16, f64>,
    exclusions: BTreeSet<u16>,
    stake_amount: f64,
    paused: bool,
}

/// Copy of the policy taken for one block cycle step
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    pub preferences: HashMap<u16, f64>,
    pub exclusions: BTreeSet<u16>,
    pub stake_amount: f64,
    pub paused: bool,
}

impl PolicySnapshot {
    /// Multiplier for a subnet, 1.0 when unset
    pub fn preference(&self, netuid: u16) -> f64 {
        preference_or_default(&self.preferences, netuid)
    }
}

/// Multiplier lookup shared by the engine and the state
pub fn preference_or_default(preferences: &HashMap<u16, f64>, netuid: u16) -> f64 {
    preferences
        .get(&netuid)
        .copied()
        .unwrap_or(DEFAULT_MULTIPLIER)
}

impl OperatingState {
    pub fn new(
        preferences: HashMap<u16, f64>,
        exclusions: BTreeSet<u16>,
        stake_amount: f64,
        paused: bool,
    ) -> Self {
        Self {
            preferences,
            exclusions,
            stake_amount,
            paused,
        }
    }

    /// Wrap into a [`SharedState`]
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            preferences: self.preferences.clone(),
            exclusions: self.exclusions.clone(),
            stake_amount: self.stake_amount,
            paused: self.paused,
        }
    }

    pub fn preference(&self, netuid: u16) -> f64 {
        preference_or_default(&self.preferences, netuid)
    }

    /// Raise a subnet's multiplier by one step, returning the new value
    pub fn boost(&mut self, netuid: u16) -> f64 {
        let updated = self.preference(netuid) + STEP;
        self.preferences.insert(netuid, updated);
        updated
    }

    /// Lower a subnet's multiplier by one step, floored at the minimum
    pub fn slash(&mut self, netuid: u16) -> f64 {
        let updated = (self.preference(netuid) - STEP).max(MIN_MULTIPLIER);
        self.preferences.insert(netuid, updated);
        updated
    }

    /// Exclude a subnet. Returns false if it was already excluded.
    pub fn exclude(&mut self, netuid: u16) -> bool {
        self.exclusions.insert(netuid)
    }

    pub fn is_excluded(&self, netuid: u16) -> bool {
        self.exclusions.contains(&netuid)
    }

    pub fn exclusions(&self) -> &BTreeSet<u16> {
        &self.exclusions
    }

    pub fn stake_amount(&self) -> f64 {
        self.stake_amount
    }

    pub fn set_stake_amount(&mut self, amount: f64) {
        self.stake_amount = amount;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}
