//! Job Service
//!
//! Business logic for job submission, queries, and reviewer decisions.

use dubflow_core::domain::approval::ApprovalDecision;
use dubflow_core::domain::job::{Job, JobStatus, TranslationRequest, VoiceKind};
use dubflow_core::dto::job::CreateJob;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::job_repository;
use crate::workflow::error::WorkflowError;
use crate::workflow::validate;

/// Service error type
#[derive(Debug)]
pub enum JobError {
    NotFound(Uuid),
    ValidationError(String),
    InvalidState(String),
    AlreadyDecided(Uuid),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for JobError {
    fn from(err: sqlx::Error) -> Self {
        JobError::DatabaseError(err)
    }
}

/// Validate and persist a new job; the workflow driver picks it up from
/// Submitted on its next scan.
pub async fn submit_job(pool: &PgPool, req: CreateJob) -> Result<Job, JobError> {
    let voice_kind = VoiceKind::parse(&req.voice_kind).ok_or_else(|| {
        JobError::ValidationError(format!(
            "InvalidVoiceKind: '{}' (expected PlatformVoice or PersonalVoice)",
            req.voice_kind
        ))
    })?;

    let request = TranslationRequest {
        source_locale: req.source_locale,
        target_locale: req.target_locale,
        voice_kind,
        speaker_count: req.speaker_count,
        subtitle_max_chars: req.subtitle_max_chars,
        source_url: req.source_url,
    };

    // Locale and parameter checks happen here too, so obviously bad
    // requests are rejected at submission instead of failing async.
    validate::validate_request(&request).map_err(|e| match e {
        WorkflowError::Validation(msg) => JobError::ValidationError(msg),
        other => JobError::ValidationError(other.to_string()),
    })?;

    let job = job_repository::create(pool, request).await?;

    tracing::info!(
        "Job created: {} ({} -> {})",
        job.id,
        job.request.source_locale,
        job.request.target_locale
    );

    Ok(job)
}

/// Get a job by ID
pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<Job, JobError> {
    let job = job_repository::find_by_id(pool, id)
        .await?
        .ok_or(JobError::NotFound(id))?;

    Ok(job)
}

/// List all jobs
pub async fn list_all_jobs(pool: &PgPool) -> Result<Vec<Job>, JobError> {
    let jobs = job_repository::list_all(pool).await?;
    Ok(jobs)
}

/// List jobs waiting at the approval gate
pub async fn list_pending_approval(pool: &PgPool) -> Result<Vec<Job>, JobError> {
    let jobs = job_repository::find_by_status(pool, JobStatus::PendingApproval).await?;
    Ok(jobs)
}

/// Record a reviewer decision on a pending job
///
/// Only the first decision for a gate is honored; later attempts get
/// `AlreadyDecided` and leave the job unchanged.
pub async fn decide_job(
    pool: &PgPool,
    job_id: Uuid,
    decision: ApprovalDecision,
    reviewed_by: &str,
    reason: Option<&str>,
) -> Result<Job, JobError> {
    let applied =
        job_repository::record_decision(pool, job_id, decision, Some(reviewed_by), reason, false)
            .await?;

    if !applied {
        // Classify on a fresh snapshot: the sweeper or another reviewer may
        // have decided between this call and any earlier read.
        let current = job_repository::find_by_id(pool, job_id)
            .await?
            .ok_or(JobError::NotFound(job_id))?;
        return Err(decision_conflict(&current));
    }

    tracing::info!("Job {} {:?} by {}", job_id, decision, reviewed_by);

    let updated = job_repository::find_by_id(pool, job_id)
        .await?
        .ok_or(JobError::NotFound(job_id))?;

    Ok(updated)
}

/// Request a new iteration of a completed job
///
/// Resets the job to Iterating while keeping the provider-side translation;
/// the engine assigns the incremented iteration number when it checkpoints
/// the new submission.
pub async fn request_reiteration(pool: &PgPool, job_id: Uuid) -> Result<Job, JobError> {
    let reopened = job_repository::begin_reiteration(pool, job_id).await?;

    let job = job_repository::find_by_id(pool, job_id)
        .await?
        .ok_or(JobError::NotFound(job_id))?;

    if !reopened {
        return Err(JobError::InvalidState(format!(
            "Job {} cannot be re-iterated from state {:?}",
            job_id, job.status
        )));
    }

    tracing::info!(
        "Job {} re-opened for iteration {}",
        job_id,
        job.iteration_number + 1
    );

    Ok(job)
}

/// Classifies a decision write that affected zero rows, from a fresh job
/// snapshot.
///
/// A gate that already holds a decision (a reviewer's or the sweeper's
/// default) is a conflict regardless of what status the caller last saw;
/// anything else means the job is simply not at the gate.
fn decision_conflict(job: &Job) -> JobError {
    let decided = job
        .approval
        .as_ref()
        .is_some_and(|gate| gate.decision.is_some());

    if decided {
        JobError::AlreadyDecided(job.id)
    } else {
        JobError::InvalidState(format!(
            "Job {} is not awaiting approval (current: {:?})",
            job.id, job.status
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dubflow_core::domain::approval::ApprovalState;

    fn job_with(status: JobStatus, approval: Option<ApprovalState>) -> Job {
        Job {
            id: Uuid::new_v4(),
            request: TranslationRequest {
                source_locale: "en-US".to_string(),
                target_locale: "es-ES".to_string(),
                voice_kind: VoiceKind::PlatformVoice,
                speaker_count: 1,
                subtitle_max_chars: None,
                source_url: "https://example.com/video.mp4".to_string(),
            },
            status,
            translation_id: Some("trn-1".to_string()),
            iteration_id: Some("it-001".to_string()),
            iteration_number: 1,
            pending_operation_id: None,
            resolved_source_url: None,
            outputs: None,
            validation: None,
            approval,
            error: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn decided_gate(decision: ApprovalDecision, automatic: bool) -> ApprovalState {
        let mut gate = ApprovalState::open(chrono::Utc::now());
        gate.decision = Some(decision);
        gate.decided_at = Some(chrono::Utc::now());
        gate.automatic = automatic;
        gate
    }

    #[test]
    fn test_reviewer_decided_gate_is_conflict() {
        let job = job_with(
            JobStatus::Approved,
            Some(decided_gate(ApprovalDecision::Approved, false)),
        );
        assert!(matches!(
            decision_conflict(&job),
            JobError::AlreadyDecided(id) if id == job.id
        ));
    }

    #[test]
    fn test_sweeper_default_racing_a_reviewer_is_conflict() {
        // The sweeper applied the default between the reviewer's request
        // and the conditional write; the second decision must see a
        // conflict, not an invalid-state error.
        let job = job_with(
            JobStatus::Rejected,
            Some(decided_gate(ApprovalDecision::Rejected, true)),
        );
        assert!(matches!(
            decision_conflict(&job),
            JobError::AlreadyDecided(_)
        ));
    }

    #[test]
    fn test_job_off_the_gate_is_invalid_state() {
        let job = job_with(JobStatus::Translating, None);
        match decision_conflict(&job) {
            JobError::InvalidState(msg) => assert!(msg.contains("Translating")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_open_gate_without_decision_is_not_a_conflict() {
        let job = job_with(
            JobStatus::PendingApproval,
            Some(ApprovalState::open(chrono::Utc::now())),
        );
        assert!(matches!(
            decision_conflict(&job),
            JobError::InvalidState(_)
        ));
    }
}
