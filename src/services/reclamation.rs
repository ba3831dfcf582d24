//! Periodic reclamation of old jobs and batches.
//!
//! A long-lived task that sweeps the store on a fixed interval, deleting
//! everything older than the retention window — terminal or not, so even
//! jobs a dispatcher never reached are eventually evicted. Runs until its
//! cancellation token is triggered.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::services::store::JobStore;

/// Run the reclamation loop.
pub async fn run(
    store: Arc<JobStore>,
    interval: Duration,
    max_age: chrono::Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        retention_secs = max_age.num_seconds(),
        "Reclamation task started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reclamation task stopping");
                break;
            }
            _ = ticker.tick() => {
                let (jobs, batches) = store.reclaim(max_age);
                if jobs > 0 || batches > 0 {
                    metrics::counter!("jobs_reclaimed").increment(jobs as u64);
                    tracing::info!(jobs, batches, "Reclaimed expired entries");
                } else {
                    tracing::debug!("Nothing to reclaim");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_evicts_expired_entries_and_stops_on_cancel() {
        let store = Arc::new(JobStore::new());
        let job_id = store.create_job();
        store.create_batch(vec![job_id], 1);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&store),
            Duration::from_millis(10),
            chrono::Duration::zero(),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get_job(job_id).is_none());
        assert_eq!(store.batch_count(), 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
