//! Operating State Unit Tests
//!
//! Tests preference bounds and the shared handle:
//! - Slash floor, unbounded boost
//! - Boost/slash round trip
//! - Snapshots detached from later mutations

use std::collections::{BTreeSet, HashMap};
use subnet_staker::state::OperatingState;

fn state() -> OperatingState {
    OperatingState::new(HashMap::from([(7, 0.3)]), BTreeSet::from([9]), 0.01, false)
}

#[test]
fn test_initial_values() {
    let state = state();
    assert_eq!(state.preference(7), 0.3);
    assert_eq!(state.preference(8), 1.0);
    assert!(state.is_excluded(9));
    assert_eq!(state.stake_amount(), 0.01);
    assert!(!state.is_paused());
}

#[test]
fn test_boost_is_unbounded() {
    let mut state = state();
    for _ in 0..100 {
        state.boost(1);
    }
    assert!((state.preference(1) - 11.0).abs() < 1e-6);
}

#[test]
fn test_slash_never_below_floor() {
    let mut state = state();
    assert!((state.slash(7) - 0.2).abs() < 1e-9);
    assert!((state.slash(7) - 0.1).abs() < 1e-9);
    assert_eq!(state.slash(7), 0.1);
    assert_eq!(state.slash(7), 0.1);
}

#[test]
fn test_boost_slash_round_trip() {
    let mut state = state();
    let start = state.preference(5);
    for _ in 0..10 {
        state.boost(5);
    }
    for _ in 0..10 {
        state.slash(5);
    }
    assert!((state.preference(5) - start).abs() < 1e-9);
}

#[test]
fn test_shared_handle_sees_mutations() {
    let shared = state().shared();
    let reader = shared.clone();

    shared.write().set_paused(true);
    shared.write().set_stake_amount(0.5);
    shared.write().exclude(3);

    let snapshot = reader.read().snapshot();
    assert!(snapshot.paused);
    assert_eq!(snapshot.stake_amount, 0.5);
    assert!(snapshot.exclusions.contains(&3));
    assert_eq!(snapshot.preference(7), 0.3);
}
