//! Digest publisher tests

use crate::support::{shared_history, MockMessaging};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use subnet_staker::metrics::MetricsState;
use subnet_staker::models::PurchaseEvent;
use subnet_staker::notifications::digest::DigestOutcome;
use subnet_staker::notifications::{DigestPublisher, DisabledMessaging};

fn event(block: u64) -> PurchaseEvent {
    PurchaseEvent {
        block,
        netuid: 1,
        subnet_name: "alpha".to_string(),
        stake_amount: 0.01,
        score: 2.0,
        pref_multiplier: 1.0,
    }
}

#[tokio::test]
async fn test_digest_only_on_multiples_of_interval() {
    let messaging = MockMessaging::new();
    let history = shared_history();
    let publisher = DigestPublisher::new(messaging.clone(), history.clone(), 10);

    let mut sent_at = Vec::new();
    for block in 1..=30 {
        history.lock().record_purchase(event(block));
        if publisher.maybe_publish(block, "summary").await == DigestOutcome::Sent {
            sent_at.push(block);
        }
    }

    assert_eq!(sent_at, vec![10, 20, 30]);
    assert!(history.lock().batch().is_empty());

    let sent = messaging.sent();
    // Each digest carries the ten purchases since the previous one
    assert_eq!(sent[1].0.matches("- Block `").count(), 10);
    assert!(sent[1].0.contains("Block: `20`"));
}

#[tokio::test]
async fn test_empty_batch_sends_nothing() {
    let messaging = MockMessaging::new();
    let publisher = DigestPublisher::new(messaging.clone(), shared_history(), 10);

    assert_eq!(
        publisher.maybe_publish(20, "summary").await,
        DigestOutcome::Skipped
    );
    assert!(messaging.sent().is_empty());
}

#[tokio::test]
async fn test_failed_send_still_clears_batch() {
    let messaging = MockMessaging::new();
    messaging.fail_send.store(true, Ordering::SeqCst);
    let history = shared_history();
    let metrics = Arc::new(MetricsState::new());
    let publisher =
        DigestPublisher::new(messaging.clone(), history.clone(), 5).with_metrics(metrics.clone());

    history.lock().record_purchase(event(15));
    let outcome = publisher.maybe_publish(15, "summary").await;

    assert_eq!(outcome, DigestOutcome::Failed);
    assert!(history.lock().batch().is_empty());
    assert_eq!(history.lock().accumulated().len(), 1);
    assert_eq!(metrics.digests_failed.get(), 1);
    assert_eq!(metrics.digests_sent.get(), 0);
}

#[tokio::test]
async fn test_disabled_messaging_is_not_counted_as_sent() {
    let history = shared_history();
    let metrics = Arc::new(MetricsState::new());
    let publisher = DigestPublisher::new(Arc::new(DisabledMessaging), history.clone(), 5)
        .with_metrics(metrics.clone());

    history.lock().record_purchase(event(10));
    let outcome = publisher.maybe_publish(10, "summary").await;

    assert_eq!(outcome, DigestOutcome::Skipped);
    assert!(history.lock().batch().is_empty());
    assert_eq!(metrics.digests_sent.get(), 0);
    assert_eq!(metrics.digests_failed.get(), 0);
}
