use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use imageburst::app_state::AppState;
use imageburst::config::AppConfig;
use imageburst::routes;
use imageburst::services::gemini::GeminiClient;
use imageburst::services::reclamation;
use imageburst::services::store::JobStore;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing imageburst server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("generation_jobs_total", "Total generation jobs submitted");
    metrics::describe_counter!(
        "generation_jobs_completed",
        "Total generation jobs completed"
    );
    metrics::describe_counter!("generation_jobs_failed", "Total generation jobs that failed");
    metrics::describe_counter!(
        "jobs_reclaimed",
        "Total jobs evicted by the reclamation sweep"
    );
    metrics::describe_histogram!("generation_seconds", "Time spent in a single provider call");

    // Initialize the Gemini image client
    tracing::info!(model = %config.gemini_model, "Initializing Gemini image client");
    let generator = GeminiClient::new(
        &config.gemini_base_url,
        &config.gemini_model,
        &config.gemini_api_key,
        Duration::from_secs(config.generation_timeout_secs),
    )
    .expect("Failed to initialize Gemini client");

    // Create shared application state around a fresh in-memory store
    let state = AppState::new(JobStore::new(), Arc::new(generator));

    // Spawn the background reclamation sweep
    let cancel = CancellationToken::new();
    let reclaim_handle = tokio::spawn(reclamation::run(
        Arc::clone(&state.store),
        Duration::from_secs(config.reclaim_interval_secs),
        chrono::Duration::seconds(config.job_retention_secs as i64),
        cancel.clone(),
    ));

    // Build API routes, with the Prometheus endpoint carrying its own state
    let app = routes::app(state).route(
        "/metrics",
        get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
    );

    tracing::info!("Starting imageburst on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    cancel.cancel();
    let _ = reclaim_handle.await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
