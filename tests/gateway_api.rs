//! HTTP surface tests for the gateway router.

use std::sync::Arc;

use aula::cache::{CacheKey, InvalidationCoordinator, KeyValueStore, MemoryStore};
use aula::infra::http::{GatewayState, build_router};
use aula::realtime::RealtimeState;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn gateway(store: Arc<MemoryStore>) -> axum::Router {
    build_router(GatewayState {
        realtime: RealtimeState::new(),
        coordinator: Arc::new(InvalidationCoordinator::new(store)),
    })
}

#[tokio::test]
async fn healthz_responds_no_content() {
    let router = gateway(Arc::new(MemoryStore::new()));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invalidate_endpoint_purges_and_reports_keys() {
    let store = Arc::new(MemoryStore::new());
    let course_id = Uuid::new_v4();
    let buyer = Uuid::new_v4();

    for key in [CacheKey::course(course_id), CacheKey::user_listing(buyer)] {
        store
            .set(&key.to_string(), b"stale".to_vec(), None)
            .await
            .expect("seed");
    }

    let router = gateway(store.clone());
    let body = json!({
        "kind": "course",
        "id": course_id,
        "members": [buyer],
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/internal/invalidate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    let report: Value = serde_json::from_slice(&bytes).expect("decode");

    let purged: Vec<String> = report["purged"]
        .as_array()
        .expect("purged array")
        .iter()
        .map(|v| v.as_str().expect("string").to_string())
        .collect();
    assert!(purged.contains(&format!("course:{course_id}")));
    assert!(purged.contains(&format!("listing:user:{buyer}")));
    assert!(report["failed"].as_array().expect("failed array").is_empty());

    assert!(
        store
            .get(&CacheKey::course(course_id).to_string())
            .await
            .expect("get")
            .is_none()
    );
}

#[tokio::test]
async fn invalidate_rejects_malformed_payloads() {
    let router = gateway(Arc::new(MemoryStore::new()));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/internal/invalidate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"kind":"course"}"#))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
