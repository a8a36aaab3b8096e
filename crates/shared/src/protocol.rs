use serde::{Deserialize, Serialize};

use crate::domain::{FitReport, JobId, JobPosting, Verdict};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFeedResponse {
    #[serde(default)]
    pub jobs: Vec<JobPosting>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitCheckResponse {
    pub job_id: JobId,
    pub report: FitReport,
}
