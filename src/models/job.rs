use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle state of a generation job.
///
/// `Pending → Generating → Complete | Error`. The two terminal states are
/// final: the store refuses any further mutation once a job reaches one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Generating,
    Complete,
    Error,
}

impl JobStatus {
    /// Whether no further transition can occur from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

/// One unit of work producing a single generated image.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    /// Generated image as a self-contained data URI; set only on `Complete`.
    pub image_url: Option<String>,
    /// Failure description from the provider call; set only on `Error`.
    pub error: Option<String>,
    /// Set at creation and used only for reclamation aging.
    pub created_at: DateTime<Utc>,
}

/// A group of jobs submitted together under one concurrency limit.
///
/// `job_ids` and `concurrency` are fixed at creation; jobs carry no
/// back-reference to their batch.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub id: Uuid,
    pub job_ids: Vec<Uuid>,
    pub concurrency: usize,
    pub created_at: DateTime<Utc>,
}
