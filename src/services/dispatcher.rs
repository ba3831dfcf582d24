//! Concurrency-limited batch dispatcher.
//!
//! Drives a batch's jobs through the generation provider with at most
//! `concurrency` calls in flight. Admission follows the job list order;
//! whichever call finishes first frees its slot for the next queued job,
//! so completion order is unconstrained and a slow or failing job never
//! blocks its siblings.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use uuid::Uuid;

use crate::services::gemini::{GenerationParams, ImageGenerator};
use crate::services::store::JobStore;

/// Process `job_ids` against the provider, at most `concurrency` in flight.
///
/// Fire-and-forget: the submit handler spawns this and returns before any
/// job completes. Every outcome, success or failure, becomes a Job Store
/// write; nothing propagates to the caller.
pub async fn dispatch(
    store: Arc<JobStore>,
    generator: Arc<dyn ImageGenerator>,
    job_ids: Vec<Uuid>,
    params: GenerationParams,
    concurrency: usize,
) {
    let total = job_ids.len();
    let concurrency = concurrency.max(1);
    let params = Arc::new(params);

    let mut queue: VecDeque<Uuid> = job_ids.into();
    let mut in_flight = FuturesUnordered::new();

    tracing::info!(jobs = total, concurrency, "Dispatching batch");

    loop {
        // Admit from the front of the queue until the window is full.
        while in_flight.len() < concurrency {
            let Some(job_id) = queue.pop_front() else {
                break;
            };
            store.mark_generating(job_id);

            let generator = Arc::clone(&generator);
            let params = Arc::clone(&params);
            in_flight.push(async move {
                let started = Instant::now();
                let result = generator.generate(&params).await;
                (job_id, result, started.elapsed())
            });
        }

        // Wait for whichever in-flight call finishes first. `None` means
        // the window is empty and the queue is drained: every job is
        // terminal and the batch is done.
        let Some((job_id, result, elapsed)) = in_flight.next().await else {
            break;
        };

        metrics::histogram!("generation_seconds").record(elapsed.as_secs_f64());
        match result {
            Ok(image_url) => {
                metrics::counter!("generation_jobs_completed").increment(1);
                tracing::info!(
                    job_id = %job_id,
                    duration_ms = elapsed.as_millis() as u64,
                    "Job complete"
                );
                store.complete_job(job_id, image_url);
            }
            Err(e) => {
                metrics::counter!("generation_jobs_failed").increment(1);
                tracing::warn!(job_id = %job_id, error = %e, "Job failed");
                store.fail_job(job_id, e.to_string());
            }
        }
    }

    tracing::info!(jobs = total, "Batch drained");
}
