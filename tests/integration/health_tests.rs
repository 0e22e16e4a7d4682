//! Health and metrics endpoint tests

use crate::support::{healthy_selector, selector, shared_state, MockChain, MockConnector, ENDPOINTS};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use std::sync::Arc;
use subnet_staker::handlers::{router, AppState};
use subnet_staker::metrics::MetricsState;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_reports_state() {
    let (_chain, selector) = healthy_selector(1);
    let gateway = selector.acquire().await.unwrap();
    gateway.close().await;

    let state = shared_state(0.05);
    state.write().set_paused(true);
    let metrics = Arc::new(MetricsState::new());
    metrics.current_block.set(1234);

    let app = router(
        Arc::new(AppState {
            started_at: Utc::now(),
            state,
            metrics: metrics.clone(),
            selector,
        }),
        metrics,
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["paused"], true);
    assert_eq!(json["last_block"], 1234);
    assert_eq!(json["stake_amount"], 0.05);
    assert_eq!(json["gateway"]["state"], "CONNECTED");
    assert_eq!(json["gateway"]["endpoints"], 3);
}

#[tokio::test]
async fn test_health_unavailable_when_exhausted() {
    let chain = MockChain::new(1);
    let connector = Arc::new(
        MockConnector::new(chain)
            .unreachable(ENDPOINTS[0])
            .unreachable(ENDPOINTS[1])
            .unreachable(ENDPOINTS[2]),
    );
    let selector = selector(connector);
    assert!(selector.acquire().await.is_err());

    let metrics = Arc::new(MetricsState::new());
    let app = router(
        Arc::new(AppState {
            started_at: Utc::now(),
            state: shared_state(0.01),
            metrics: metrics.clone(),
            selector,
        }),
        metrics,
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (_chain, selector) = healthy_selector(1);
    let metrics = Arc::new(MetricsState::new());
    metrics.blocks_processed.inc();

    let app = router(
        Arc::new(AppState {
            started_at: Utc::now(),
            state: shared_state(0.01),
            metrics: metrics.clone(),
            selector,
        }),
        metrics,
    );

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("staker_blocks_processed_total 1"));

    let live = app
        .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(live.status(), StatusCode::OK);
}
