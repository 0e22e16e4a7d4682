//! Orchestrator tests
//!
//! Both cycles share one task: commands sent while blocks are being processed
//! must take effect on the following blocks.

use crate::support::{
    healthy_selector, shared_history, shared_state, wallet, MockMessaging, VALIDATOR,
};
use std::sync::atomic::Ordering;
use std::time::Duration;
use subnet_staker::control::{CommandInterpreter, ControlLoop};
use subnet_staker::engine::BlockCycle;
use subnet_staker::notifications::DigestPublisher;
use subnet_staker::orchestrator::Orchestrator;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_pause_command_stops_allocation() {
    let (chain, selector) = healthy_selector(1);
    *chain.block_time.lock() = Duration::from_millis(5);
    let state = shared_state(0.01);
    let history = shared_history();
    let messaging = MockMessaging::new();

    let block_cycle = BlockCycle::new(
        selector.clone(),
        state.clone(),
        history.clone(),
        DigestPublisher::new(messaging.clone(), history.clone(), 1000),
        wallet(),
        VALIDATOR.to_string(),
    );
    let control = ControlLoop::new(
        messaging.clone(),
        CommandInterpreter::new(
            selector,
            state.clone(),
            history.clone(),
            wallet(),
            VALIDATOR.to_string(),
        ),
        Duration::from_millis(5),
    );
    let orchestrator = Orchestrator::new(block_cycle, Some(control));
    let cancel_token = CancellationToken::new();

    let canceller = cancel_token.clone();
    let inbox = messaging.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        inbox.push_text(1, "100", "/pause");
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(cancel_token))
        .await
        .expect("orchestrator did not stop");
    assert!(result.is_ok());

    assert!(state.read().is_paused());
    let staked_before_pause = chain.mutations().len();
    assert!(staked_before_pause > 0);

    // Every purchase happened at a block before the pause took effect
    let events = history.lock().accumulated().to_vec();
    assert_eq!(events.len(), staked_before_pause);
    assert!(messaging
        .sent()
        .iter()
        .any(|(text, chat)| text.starts_with("Bot is now paused") && chat.as_deref() == Some("100")));
}

#[tokio::test]
async fn test_block_cycle_failure_ends_run() {
    let (chain, selector) = healthy_selector(1);
    chain.fail_queries.store(true, Ordering::SeqCst);
    let history = shared_history();

    let block_cycle = BlockCycle::new(
        selector,
        shared_state(0.01),
        history.clone(),
        DigestPublisher::new(MockMessaging::new(), history, 10),
        wallet(),
        VALIDATOR.to_string(),
    );
    let orchestrator = Orchestrator::new(block_cycle, None);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.run(CancellationToken::new()),
    )
    .await
    .expect("orchestrator did not stop");

    assert!(result.is_err());
    assert_eq!(chain.open_handles(), 0);
}

#[tokio::test]
async fn test_cancel_without_messaging() {
    let (chain, selector) = healthy_selector(1);
    *chain.block_time.lock() = Duration::from_millis(5);
    let history = shared_history();

    let block_cycle = BlockCycle::new(
        selector,
        shared_state(0.01),
        history.clone(),
        DigestPublisher::new(MockMessaging::new(), history, 10),
        wallet(),
        VALIDATOR.to_string(),
    );
    let orchestrator = Orchestrator::new(block_cycle, None);
    let cancel_token = CancellationToken::new();

    let canceller = cancel_token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(cancel_token))
        .await
        .expect("orchestrator did not stop");
    assert!(result.is_ok());
    assert!(chain.block.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_cancel_while_waiting_closes_handle() {
    let (chain, selector) = healthy_selector(1);
    *chain.block_time.lock() = Duration::from_secs(30);
    let history = shared_history();

    let block_cycle = BlockCycle::new(
        selector,
        shared_state(0.01),
        history.clone(),
        DigestPublisher::new(MockMessaging::new(), history.clone(), 10),
        wallet(),
        VALIDATOR.to_string(),
    );
    let control = ControlLoop::new(
        MockMessaging::new(),
        CommandInterpreter::new(
            healthy_selector(1).1,
            shared_state(0.01),
            shared_history(),
            wallet(),
            VALIDATOR.to_string(),
        ),
        Duration::from_millis(5),
    );
    let orchestrator = Orchestrator::new(block_cycle, Some(control));
    let cancel_token = CancellationToken::new();

    let canceller = cancel_token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(cancel_token))
        .await
        .expect("orchestrator did not stop");

    assert!(result.is_ok());
    // The first block completed its allocation, then the wait was interrupted
    assert_eq!(chain.mutations().len(), 1);
    assert_eq!(history.lock().accumulated().len(), 1);
    assert_eq!(chain.open_handles(), 0);
}

#[tokio::test]
async fn test_cancelled_before_start_processes_nothing() {
    let (chain, selector) = healthy_selector(1);
    let history = shared_history();
    let block_cycle = BlockCycle::new(
        selector,
        shared_state(0.01),
        history.clone(),
        DigestPublisher::new(MockMessaging::new(), history, 10),
        wallet(),
        VALIDATOR.to_string(),
    );

    let cancel_token = CancellationToken::new();
    cancel_token.cancel();

    assert!(block_cycle.run(cancel_token).await.is_ok());
    assert!(chain.mutations().is_empty());
}
