//! Allocation Engine Unit Tests
//!
//! Tests subnet scoring and selection:
//! - Root subnet and exclusions never chosen
//! - Preference multipliers scale the score
//! - Maximum effective score wins, first on ties

use std::collections::{BTreeSet, HashMap};
use subnet_staker::engine::{effective_score, select_best_subnet};
use subnet_staker::models::SubnetSnapshot;

fn subnet(netuid: u16, price: f64, emission: f64) -> SubnetSnapshot {
    SubnetSnapshot {
        netuid,
        name: format!("sn{}", netuid),
        price,
        emission,
        symbol: String::new(),
    }
}

#[test]
fn test_highest_score_wins() {
    let subnets = vec![
        subnet(1, 1.0, 1.0),
        subnet(2, 0.1, 1.0),
        subnet(3, 2.0, 1.0),
    ];
    let selection = select_best_subnet(&subnets, &BTreeSet::new(), &HashMap::new());

    assert_eq!(selection.netuid(), Some(2));
    assert!((selection.score - 10.0).abs() < 1e-9);
}

#[test]
fn test_root_is_never_chosen() {
    let subnets = vec![subnet(0, 0.001, 1000.0), subnet(5, 1.0, 0.5)];
    let selection = select_best_subnet(&subnets, &BTreeSet::new(), &HashMap::new());

    assert_eq!(selection.netuid(), Some(5));
}

#[test]
fn test_exclusions_are_skipped() {
    let subnets = vec![subnet(1, 1.0, 1.0), subnet(2, 0.1, 1.0)];
    let exclusions = BTreeSet::from([2]);
    let selection = select_best_subnet(&subnets, &exclusions, &HashMap::new());

    assert_eq!(selection.netuid(), Some(1));
}

#[test]
fn test_preference_can_change_the_winner() {
    let subnets = vec![subnet(1, 1.0, 1.0), subnet(2, 1.0, 1.5)];
    let preferences = HashMap::from([(1, 2.0)]);
    let selection = select_best_subnet(&subnets, &BTreeSet::new(), &preferences);

    assert_eq!(selection.netuid(), Some(1));
    assert!((selection.score - 2.0).abs() < 1e-9);
}

#[test]
fn test_no_candidates() {
    let subnets = vec![subnet(0, 1.0, 1.0), subnet(1, 0.0, 1.0)];
    let selection = select_best_subnet(&subnets, &BTreeSet::new(), &HashMap::new());

    assert_eq!(selection.subnet, None);
    assert_eq!(selection.score, 0.0);

    let empty = select_best_subnet(&[], &BTreeSet::new(), &HashMap::new());
    assert_eq!(empty.subnet, None);
}

#[test]
fn test_chosen_has_maximum_effective_score() {
    let subnets: Vec<SubnetSnapshot> = (0..40u16)
        .map(|i| subnet(i, 0.5 + (i % 7) as f64, 1.0 + (i % 5) as f64))
        .collect();
    let exclusions = BTreeSet::from([4, 11]);
    let preferences = HashMap::from([(3, 1.7), (9, 0.4), (22, 2.5)]);

    let selection = select_best_subnet(&subnets, &exclusions, &preferences);
    let chosen = selection.subnet.unwrap();

    assert_ne!(chosen.netuid, 0);
    assert!(!exclusions.contains(&chosen.netuid));
    for s in &subnets {
        if let Some(score) = effective_score(s, &exclusions, &preferences) {
            assert!(score <= selection.score);
        }
    }
}
