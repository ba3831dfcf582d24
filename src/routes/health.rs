use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub jobs: usize,
    pub batches: usize,
}

/// GET /health — liveness plus current store occupancy.
///
/// The only external dependency is the generation provider, which is
/// treated as opaque and not probed here.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs: state.store.job_count(),
        batches: state.store.batch_count(),
    })
}
