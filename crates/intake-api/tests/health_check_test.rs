//! Liveness and health endpoint tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
};
use intake_api::{create_router, AppState, HttpPolicy};
use intake_core::{MemoryApplicationStore, StorageError};
use serde_json::Value;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).expect("build request")
}

#[tokio::test]
async fn root_returns_plain_text_acknowledgement() {
    let store = MemoryApplicationStore::new();
    let app = create_router(AppState::new(Arc::new(store)), &HttpPolicy::default());

    let response = app.oneshot(get("/")).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[CONTENT_TYPE].to_str().expect("ascii content type");
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    assert_eq!(&body[..], b"Hello");
}

#[tokio::test]
async fn health_check_returns_success_when_store_is_reachable() {
    let store = MemoryApplicationStore::new();
    let app = create_router(AppState::new(Arc::new(store)), &HttpPolicy::default());

    let response = app.oneshot(get("/health")).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let health: Value = serde_json::from_slice(&body).expect("health response should be JSON");

    assert_eq!(health["status"], "healthy");
    assert_eq!(health["checks"]["storage"]["status"], "up");
    assert!(health["checks"]["storage"].get("message").is_none());
    assert!(health["version"].is_string());
    assert!(health["timestamp"].is_string());
}

#[tokio::test]
async fn health_check_returns_unavailable_when_store_is_down() {
    let store = MemoryApplicationStore::new();
    store.fail_inserts_with(StorageError::Unavailable("connection refused".to_string())).await;
    let app = create_router(AppState::new(Arc::new(store)), &HttpPolicy::default());

    let response = app.oneshot(get("/health")).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let health: Value = serde_json::from_slice(&body).expect("health response should be JSON");

    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["checks"]["storage"]["status"], "down");
    assert_eq!(health["checks"]["storage"]["message"], "Storage unavailable: connection refused");
}

#[tokio::test]
async fn health_check_handles_concurrent_requests() {
    let store = MemoryApplicationStore::new();
    let app = create_router(AppState::new(Arc::new(store)), &HttpPolicy::default());

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.oneshot(get("/health")).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.expect("task panicked").expect("failed to make request");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn unknown_route_returns_not_found() {
    let store = MemoryApplicationStore::new();
    let app = create_router(AppState::new(Arc::new(store)), &HttpPolicy::default());

    let response = app.oneshot(get("/api/applications")).await.expect("failed to make request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
