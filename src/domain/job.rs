//! Job - Delivery Job Status

use serde::{Deserialize, Serialize};

/// Pipeline status of a delivery job as reported by the API
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Building,
    Qa,
    Previewing,
    Delivered,
    Failed,
}

impl JobStatus {
    /// Whether the job will not change status any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Delivered | JobStatus::Failed)
    }
}

/// Status payload returned by `GET /jobs/{id}/status`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job identifier
    pub job_id: String,
    /// Current pipeline status
    pub status: JobStatus,
    /// Optional progress detail from the pipeline
    #[serde(default)]
    pub detail: Option<String>,
}
