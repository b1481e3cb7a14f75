//! Job DTOs for inter-service communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{Job, JobStatus};

/// Request to submit a new translation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    pub source_locale: String,
    pub target_locale: String,
    /// "PlatformVoice" or "PersonalVoice".
    pub voice_kind: String,
    pub speaker_count: i32,
    pub subtitle_max_chars: Option<i32>,
    pub source_url: String,
}

/// Reviewer decision submitted through the approval endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub reviewed_by: String,
    pub reason: Option<String>,
}

/// Compact job view for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub status: JobStatus,
    pub source_locale: String,
    pub target_locale: String,
    pub iteration_number: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        JobSummary {
            id: job.id,
            status: job.status,
            source_locale: job.request.source_locale.clone(),
            target_locale: job.request.target_locale.clone(),
            iteration_number: job.iteration_number,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
