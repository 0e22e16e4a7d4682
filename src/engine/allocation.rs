//! Subnet scoring and selection
//!
//! ```text
//! raw_score       = emission / price          (price > 0 only)
//! effective_score = raw_score * preference    (preference defaults to 1.0)
//! ```
//!
//! The root subnet and excluded subnets never score. The winner is the
//! strictly greatest positive effective score; ties keep gateway order.

use crate::models::SubnetSnapshot;
use crate::state::preference_or_default;
use std::collections::{BTreeSet, HashMap};

/// Result of a selection pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    /// Highest scoring subnet, if any scored above zero
    pub subnet: Option<&'a SubnetSnapshot>,
    /// Its effective score, 0.0 when nothing was chosen
    pub score: f64,
}

impl Selection<'_> {
    pub fn netuid(&self) -> Option<u16> {
        self.subnet.map(|s| s.netuid)
    }
}

/// Effective score of a single subnet, `None` if it may not be chosen
pub fn effective_score(
    subnet: &SubnetSnapshot,
    exclusions: &BTreeSet<u16>,
    preferences: &HashMap<u16, f64>,
) -> Option<f64> {
    if subnet.is_root() || exclusions.contains(&subnet.netuid) {
        return None;
    }
    subnet
        .raw_score()
        .map(|raw| raw * preference_or_default(preferences, subnet.netuid))
}

/// Pick the subnet with the highest positive effective score
pub fn select_best_subnet<'a>(
    subnets: &'a [SubnetSnapshot],
    exclusions: &BTreeSet<u16>,
    preferences: &HashMap<u16, f64>,
) -> Selection<'a> {
    let mut best = Selection {
        subnet: None,
        score: 0.0,
    };

    for subnet in subnets {
        if let Some(score) = effective_score(subnet, exclusions, preferences) {
            if score > best.score {
                best = Selection {
                    subnet: Some(subnet),
                    score,
                };
            }
        }
    }

    best
}
