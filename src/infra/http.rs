//! Gateway HTTP surface.
//!
//! The binary exposes the realtime WebSocket endpoint plus a small internal
//! API: a health probe and an invalidation endpoint for write paths that run
//! outside this process. The endpoint accepts the already-enumerated owner
//! and member sets; key enumeration itself stays in [`crate::cache`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::cache::{CacheSync, EntityKind, InvalidationCoordinator, Mutation};
use crate::realtime::{self, RealtimeState};

#[derive(Clone)]
pub struct GatewayState {
    pub realtime: RealtimeState,
    pub coordinator: Arc<InvalidationCoordinator>,
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/internal/invalidate", post(invalidate))
        .with_state(state.clone())
        .merge(realtime::routes(state.realtime))
}

#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    pub kind: EntityKind,
    pub id: Uuid,
    #[serde(default)]
    pub owners: Vec<Uuid>,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub purged: Vec<String>,
    pub failed: Vec<String>,
}

impl From<CacheSync> for InvalidateResponse {
    fn from(sync: CacheSync) -> Self {
        Self {
            purged: sync.purged.iter().map(ToString::to_string).collect(),
            failed: sync.failed.iter().map(ToString::to_string).collect(),
        }
    }
}

async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn invalidate(
    State(state): State<GatewayState>,
    Json(request): Json<InvalidateRequest>,
) -> Response {
    let mutation = Mutation::new(request.kind, request.id)
        .with_owners(request.owners)
        .with_members(request.members);

    let sync = state.coordinator.on_mutation(&mutation).await;
    info!(
        entity_kind = %request.kind,
        entity_id = %request.id,
        outcome = %sync,
        "External invalidation request handled"
    );

    // Degraded passes still return 200: the canonical write already
    // happened, and the failed keys are reported for follow-up.
    (StatusCode::OK, Json(InvalidateResponse::from(sync))).into_response()
}

#[cfg(test)]
mod tests {
    use crate::cache::{CacheKey, KeyValueStore, MemoryStore};

    use super::*;

    #[tokio::test]
    async fn invalidate_request_purges_enumerated_keys() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = Arc::new(InvalidationCoordinator::new(store.clone()));

        let course_id = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        for key in [CacheKey::course(course_id), CacheKey::user_listing(buyer)] {
            store
                .set(&key.to_string(), b"stale".to_vec(), None)
                .await
                .expect("seed");
        }

        let state = GatewayState {
            realtime: RealtimeState::new(),
            coordinator,
        };
        let request = InvalidateRequest {
            kind: EntityKind::Course,
            id: course_id,
            owners: Vec::new(),
            members: vec![buyer],
        };
        let _ = invalidate(State(state), Json(request)).await;

        assert!(
            store
                .get(&CacheKey::course(course_id).to_string())
                .await
                .expect("get")
                .is_none()
        );
        assert!(
            store
                .get(&CacheKey::user_listing(buyer).to_string())
                .await
                .expect("get")
                .is_none()
        );
    }

    #[test]
    fn invalidate_request_decodes_with_defaulted_sets() {
        let body = format!(r#"{{"kind":"course","id":"{}"}}"#, Uuid::new_v4());
        let request: InvalidateRequest = serde_json::from_str(&body).expect("decode");
        assert!(request.owners.is_empty());
        assert!(request.members.is_empty());
    }
}
