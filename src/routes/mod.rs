pub mod generate;
pub mod health;
pub mod metrics;

use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Build the application router.
///
/// Shared between `main` and the integration tests, so both exercise the
/// same routes and middleware stack. The `/metrics` scrape route is added
/// separately in `main` because it carries its own state.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Static UI (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../../static/index.html")) }))
        // API endpoints
        .route("/health", get(health::health_check))
        .route("/api/v1/generate", post(generate::submit_batch))
        .route("/api/v1/jobs/{job_id}", get(generate::get_job_status))
        .route("/api/v1/batches/{batch_id}", get(generate::get_batch))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)) // 10 MB limit
}
