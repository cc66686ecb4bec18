//! Router-level tests — requests go straight into the router via
//! `tower::ServiceExt::oneshot`, no listener needed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pagerelay_broker::AgentHandle;
use pagerelay_core::RelayConfig;
use pagerelay_server::{build_router, AppState};
use tokio::sync::mpsc;
use tower::ServiceExt;

fn app() -> (Router, Arc<AppState>) {
    let config = RelayConfig {
        sanitizer_url: None,
        ..RelayConfig::default()
    };
    let state = Arc::new(AppState::new(config).unwrap());
    (build_router(state.clone()), state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_missing_url_is_bad_request() {
    let (app, _) = app();
    let (status, body) = get(app, "/convert").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_url");
}

#[tokio::test]
async fn test_blank_url_is_bad_request() {
    let (app, _) = app();
    let (status, body) = get(app, "/convert?url=&is_news=true").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_url");
}

#[tokio::test]
async fn test_no_agent_is_service_unavailable_without_waiting() {
    let (app, state) = app();
    let started = Instant::now();
    let (status, body) = get(app, "/convert?url=http://x").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "no_agent_connected");
    assert_eq!(body["message"], "No browser connected");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(state.pending.is_empty());
}

#[tokio::test]
async fn test_dead_agent_is_internal_error() {
    let (app, state) = app();
    let (tx, rx) = mpsc::unbounded_channel();
    state.agents.register(AgentHandle::new(tx));
    drop(rx);

    let (status, body) = get(app, "/convert?url=http://x").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "dispatch_failed");
    assert!(state.pending.is_empty());
}

#[tokio::test]
async fn test_status_counts() {
    let (app, _) = app();
    let (status, body) = get(app, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"agents": 0, "pending": 0}));
}

#[tokio::test]
async fn test_plain_get_on_socket_endpoint_is_rejected() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
