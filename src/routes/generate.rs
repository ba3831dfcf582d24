use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use base64::Engine;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::generation::{
    BatchStatusResponse, GenerateRequest, GenerateResponse, JobStatusResponse,
};
use crate::models::job::JobStatus;
use crate::services::dispatcher;
use crate::services::gemini::{GenerationParams, ReferenceImage};

/// POST /api/v1/generate — submit a batch of generation jobs.
///
/// Validates the request, creates the jobs and batch, then spawns the
/// dispatcher and returns immediately. Clients poll per-job status until
/// every job is terminal; there is no aggregate "batch failed" signal.
pub async fn submit_batch(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate()?;

    let image = match request.image.as_deref() {
        Some(uri) => Some(decode_reference_image(uri)?),
        None => None,
    };

    let job_ids: Vec<Uuid> = (0..request.image_count)
        .map(|_| state.store.create_job())
        .collect();
    let batch_id = state.store.create_batch(job_ids.clone(), request.concurrency);

    metrics::counter!("generation_jobs_total").increment(job_ids.len() as u64);
    tracing::info!(
        batch_id = %batch_id,
        jobs = job_ids.len(),
        concurrency = request.concurrency,
        "Batch accepted"
    );

    let params = GenerationParams {
        prompt: request.prompt,
        temperature: request.temperature,
        image,
        mode: request.mode,
    };
    tokio::spawn(dispatcher::dispatch(
        Arc::clone(&state.store),
        Arc::clone(&state.generator),
        job_ids.clone(),
        params,
        request.concurrency,
    ));

    Ok(Json(GenerateResponse {
        batch_id,
        job_ids,
        status: JobStatus::Pending,
    }))
}

/// GET /api/v1/jobs/{job_id} — current snapshot of one job.
///
/// An unknown identifier is a normal outcome (never created, or already
/// reclaimed), answered with 404.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state.store.get_job(job_id).ok_or(ApiError::NotFound {
        entity: "job",
        id: job_id,
    })?;

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status,
        image_url: job.image_url,
        error: job.error,
    }))
}

/// GET /api/v1/batches/{batch_id} — batch snapshot.
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> ApiResult<Json<BatchStatusResponse>> {
    let batch = state.store.get_batch(batch_id).ok_or(ApiError::NotFound {
        entity: "batch",
        id: batch_id,
    })?;

    Ok(Json(BatchStatusResponse {
        batch_id: batch.id,
        job_ids: batch.job_ids,
        concurrency: batch.concurrency,
        created_at: batch.created_at,
    }))
}

/// Decode and sanity-check a `data:<mime>;base64,<payload>` reference image.
fn decode_reference_image(uri: &str) -> Result<ReferenceImage, ApiError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ApiError::BadRequest("image must be a base64 data URI".to_string()))?;
    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| ApiError::BadRequest("image must be a base64 data URI".to_string()))?;

    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ApiError::BadRequest(format!("image is not valid base64: {e}")))?;

    // Validate image format using the `image` crate
    image::guess_format(&data).map_err(|_| {
        ApiError::BadRequest("image payload is not a recognized image format".to_string())
    })?;

    Ok(ReferenceImage {
        mime_type: mime_type.to_string(),
        data,
    })
}
