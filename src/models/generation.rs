use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::job::JobStatus;

/// How an attached reference image is used by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageMode {
    /// The prompt describes a modification of the attached image.
    Edit,
    /// The attached image is style/content guidance for a new image.
    Reference,
}

/// Request to generate a batch of images.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[garde(length(min = 3))]
    pub prompt: String,

    /// Number of independent jobs to create for this prompt.
    #[garde(range(min = 1, max = 10))]
    pub image_count: usize,

    /// Maximum simultaneously in-flight provider calls for this batch.
    #[garde(range(min = 1, max = 5))]
    pub concurrency: usize,

    #[garde(range(min = 0.0, max = 2.0))]
    pub temperature: f64,

    /// Optional reference image as a base64 data URI.
    #[garde(skip)]
    pub image: Option<String>,

    #[garde(skip)]
    pub mode: Option<ImageMode>,
}

/// Response after accepting a batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub batch_id: Uuid,
    pub job_ids: Vec<Uuid>,
    pub status: JobStatus,
}

/// Response for polling a single job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot of a batch, so a client can recover its job list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusResponse {
    pub batch_id: Uuid,
    pub job_ids: Vec<Uuid>,
    pub concurrency: usize,
    pub created_at: DateTime<Utc>,
}
