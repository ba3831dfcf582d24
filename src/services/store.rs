use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::job::{Batch, Job, JobStatus};

/// Fields merged into a job by [`JobStore::update_job`].
#[derive(Debug, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub image_url: Option<String>,
    pub error: Option<String>,
}

/// In-memory store for jobs and batches.
///
/// An explicitly constructed instance shared (behind `Arc`) by the request
/// handlers, the dispatcher, and the reclamation sweep; tests build their
/// own isolated instances. All operations are synchronous and the only
/// failure mode is "not found", which callers treat as a normal outcome.
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    batches: RwLock<HashMap<Uuid, Batch>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            batches: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a fresh `Pending` job and return its identifier.
    pub fn create_job(&self) -> Uuid {
        let id = Uuid::new_v4();
        let job = Job {
            id,
            status: JobStatus::Pending,
            image_url: None,
            error: None,
            created_at: Utc::now(),
        };
        self.jobs.write().insert(id, job);
        id
    }

    /// Current snapshot of a job, if it still exists.
    pub fn get_job(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().get(&id).cloned()
    }

    /// Merge fields into an existing job.
    ///
    /// Silently does nothing when the job is unknown (already reclaimed —
    /// an accepted race, not an error) or already in a terminal state.
    pub fn update_job(&self, id: Uuid, update: JobUpdate) {
        let mut jobs = self.jobs.write();
        let Some(job) = jobs.get_mut(&id) else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }
        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(image_url) = update.image_url {
            job.image_url = Some(image_url);
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }
    }

    /// Transition a job to `Generating`.
    pub fn mark_generating(&self, id: Uuid) {
        self.update_job(
            id,
            JobUpdate {
                status: Some(JobStatus::Generating),
                ..Default::default()
            },
        );
    }

    /// Terminal success: store the image and mark `Complete`.
    pub fn complete_job(&self, id: Uuid, image_url: String) {
        self.update_job(
            id,
            JobUpdate {
                status: Some(JobStatus::Complete),
                image_url: Some(image_url),
                ..Default::default()
            },
        );
    }

    /// Terminal failure: store the message and mark `Error`.
    pub fn fail_job(&self, id: Uuid, error: String) {
        self.update_job(
            id,
            JobUpdate {
                status: Some(JobStatus::Error),
                error: Some(error),
                ..Default::default()
            },
        );
    }

    /// Insert a batch over already-created jobs and return its identifier.
    pub fn create_batch(&self, job_ids: Vec<Uuid>, concurrency: usize) -> Uuid {
        let id = Uuid::new_v4();
        let batch = Batch {
            id,
            job_ids,
            concurrency,
            created_at: Utc::now(),
        };
        self.batches.write().insert(id, batch);
        id
    }

    pub fn get_batch(&self, id: Uuid) -> Option<Batch> {
        self.batches.read().get(&id).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.read().len()
    }

    /// Delete every job and batch older than `max_age`, regardless of state.
    ///
    /// Returns `(jobs_removed, batches_removed)`. Cannot fail; absent
    /// entries are simply skipped.
    pub fn reclaim(&self, max_age: chrono::Duration) -> (usize, usize) {
        let cutoff = Utc::now() - max_age;

        let jobs_removed = {
            let mut jobs = self.jobs.write();
            let before = jobs.len();
            jobs.retain(|_, job| job.created_at > cutoff);
            before - jobs.len()
        };

        let batches_removed = {
            let mut batches = self.batches.write();
            let before = batches.len();
            batches.retain(|_, batch| batch.created_at > cutoff);
            before - batches.len()
        };

        (jobs_removed, batches_removed)
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
