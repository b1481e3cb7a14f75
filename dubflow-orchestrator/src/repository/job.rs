//! Job Repository
//!
//! Handles all database operations related to jobs. The jobs row is the
//! workflow checkpoint: every stage transition is one atomic UPDATE of
//! status plus the stage-specific identifiers, written before the next
//! stage begins. Postgres row-level write serialization gives per-job
//! mutation exclusivity.

use dubflow_core::domain::approval::{ApprovalDecision, ApprovalState};
use dubflow_core::domain::job::{Job, JobOutputs, JobStatus, TranslationRequest, VoiceKind};
use dubflow_core::domain::validation::ValidationOutcome;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new job in the database
pub async fn create(pool: &PgPool, request: TranslationRequest) -> Result<Job, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        INSERT INTO jobs (id, source_locale, target_locale, voice_kind, speaker_count,
                          subtitle_max_chars, source_url, status, iteration_number,
                          created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $9)
        "#,
    )
    .bind(id)
    .bind(&request.source_locale)
    .bind(&request.target_locale)
    .bind(request.voice_kind.as_str())
    .bind(request.speaker_count)
    .bind(request.subtitle_max_chars)
    .bind(&request.source_url)
    .bind(status_to_string(JobStatus::Submitted))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Job {
        id,
        request,
        status: JobStatus::Submitted,
        translation_id: None,
        iteration_id: None,
        iteration_number: 0,
        pending_operation_id: None,
        resolved_source_url: None,
        outputs: None,
        validation: None,
        approval: None,
        error: None,
        created_at: now,
        updated_at: now,
    })
}

/// Find a job by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query_as::<_, JobRow>(&select_query("WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.into()))
}

/// List all jobs, newest first
pub async fn list_all(pool: &PgPool) -> Result<Vec<Job>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JobRow>(&select_query("ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Find jobs by status
pub async fn find_by_status(pool: &PgPool, status: JobStatus) -> Result<Vec<Job>, sqlx::Error> {
    let rows =
        sqlx::query_as::<_, JobRow>(&select_query("WHERE status = $1 ORDER BY created_at ASC"))
            .bind(status_to_string(status))
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Find jobs the workflow driver should advance
///
/// Every non-terminal status except PendingApproval: freshly submitted jobs,
/// jobs recovering after a crash mid-stage, and approved jobs awaiting
/// output finalization.
pub async fn find_runnable(pool: &PgPool) -> Result<Vec<Job>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JobRow>(&select_query(
        "WHERE status NOT IN ('PendingApproval', 'Completed', 'Rejected', 'Failed')
         ORDER BY created_at ASC",
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Find jobs whose approval gate opened before `cutoff` with no decision
pub async fn find_expired_gates(
    pool: &PgPool,
    cutoff: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<Job>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JobRow>(&select_query(
        "WHERE status = 'PendingApproval'
           AND approval_decision IS NULL
           AND approval_requested_at < $1
         ORDER BY approval_requested_at ASC",
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Checkpoint writers
// =============================================================================

/// Record a bare status transition
pub async fn checkpoint_status(
    pool: &PgPool,
    job_id: Uuid,
    status: JobStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status_to_string(status))
        .bind(chrono::Utc::now())
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Checkpoint "about to perform a provider write with this identifier"
///
/// Written durably BEFORE the provider call. A job recovered in this state
/// re-submits with a freshly generated operation id; the outcome checkpoint
/// is [`confirm_operation`].
pub async fn record_pending_operation(
    pool: &PgPool,
    job_id: Uuid,
    status: JobStatus,
    translation_id: &str,
    iteration_id: Option<&str>,
    iteration_number: Option<i32>,
    operation_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET status = $1,
            translation_id = $2,
            iteration_id = COALESCE($3, iteration_id),
            iteration_number = COALESCE($4, iteration_number),
            pending_operation_id = $5,
            updated_at = $6
        WHERE id = $7
        "#,
    )
    .bind(status_to_string(status))
    .bind(translation_id)
    .bind(iteration_id)
    .bind(iteration_number)
    .bind(operation_id)
    .bind(chrono::Utc::now())
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Checkpoint "the provider accepted the submission"
///
/// Clears the pending operation id and advances the status. A job recovered
/// past this checkpoint resumes polling the recorded identifier and never
/// re-submits.
pub async fn confirm_operation(
    pool: &PgPool,
    job_id: Uuid,
    status: JobStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE jobs SET status = $1, pending_operation_id = NULL, updated_at = $2 WHERE id = $3",
    )
    .bind(status_to_string(status))
    .bind(chrono::Utc::now())
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store the resolved, signed source media URL
pub async fn set_resolved_source(
    pool: &PgPool,
    job_id: Uuid,
    url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET resolved_source_url = $1, updated_at = $2 WHERE id = $3")
        .bind(url)
        .bind(chrono::Utc::now())
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Store the output URLs of a succeeded iteration
pub async fn set_outputs(
    pool: &PgPool,
    job_id: Uuid,
    outputs: &JobOutputs,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET output_media_url = $1,
            output_source_subtitle_url = $2,
            output_target_subtitle_url = $3,
            output_metadata_url = $4,
            updated_at = $5
        WHERE id = $6
        "#,
    )
    .bind(&outputs.translated_media_url)
    .bind(&outputs.source_subtitle_url)
    .bind(&outputs.target_subtitle_url)
    .bind(&outputs.metadata_url)
    .bind(chrono::Utc::now())
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Attach the validation outcome
pub async fn set_validation(
    pool: &PgPool,
    job_id: Uuid,
    outcome: &ValidationOutcome,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET validation = $1, updated_at = $2 WHERE id = $3")
        .bind(serde_json::to_value(outcome).unwrap_or(serde_json::Value::Null))
        .bind(chrono::Utc::now())
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Open the approval gate: PendingApproval with the deadline anchor set
pub async fn open_approval_gate(pool: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now();

    sqlx::query(
        r#"
        UPDATE jobs
        SET status = 'PendingApproval',
            approval_requested_at = $1,
            approval_decision = NULL,
            approval_reviewed_by = NULL,
            approval_reason = NULL,
            approval_decided_at = NULL,
            approval_automatic = FALSE,
            updated_at = $1
        WHERE id = $2
        "#,
    )
    .bind(now)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record an approval decision, honoring only the first one
///
/// The conditional WHERE makes "first decision wins" a database guarantee:
/// returns false when the gate was already decided (or the job is no longer
/// pending), in which case nothing changed.
pub async fn record_decision(
    pool: &PgPool,
    job_id: Uuid,
    decision: ApprovalDecision,
    reviewed_by: Option<&str>,
    reason: Option<&str>,
    automatic: bool,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();
    let next_status = match decision {
        ApprovalDecision::Approved => JobStatus::Approved,
        ApprovalDecision::Rejected => JobStatus::Rejected,
    };

    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET status = $1,
            approval_decision = $2,
            approval_reviewed_by = $3,
            approval_reason = $4,
            approval_decided_at = $5,
            approval_automatic = $6,
            updated_at = $5
        WHERE id = $7
          AND status = 'PendingApproval'
          AND approval_decision IS NULL
        "#,
    )
    .bind(status_to_string(next_status))
    .bind(decision.as_str())
    .bind(reviewed_by)
    .bind(reason)
    .bind(now)
    .bind(automatic)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Re-open a completed job for a new iteration
///
/// Keeps the translation id, bumps nothing yet: the engine assigns the next
/// iteration number when it checkpoints the new iteration submission.
/// Returns false if the job was not in Completed.
pub async fn begin_reiteration(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET status = 'Iterating',
            iteration_id = NULL,
            pending_operation_id = NULL,
            output_media_url = NULL,
            output_source_subtitle_url = NULL,
            output_target_subtitle_url = NULL,
            output_metadata_url = NULL,
            validation = NULL,
            approval_requested_at = NULL,
            approval_decision = NULL,
            approval_reviewed_by = NULL,
            approval_reason = NULL,
            approval_decided_at = NULL,
            approval_automatic = FALSE,
            updated_at = $1
        WHERE id = $2 AND status = 'Completed'
        "#,
    )
    .bind(chrono::Utc::now())
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Bump updated_at; called once per status poll
pub async fn touch(pool: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET updated_at = $1 WHERE id = $2")
        .bind(chrono::Utc::now())
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Mark a job failed with a human-readable error message
pub async fn set_failed(pool: &PgPool, job_id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE jobs SET status = 'Failed', error = $1, pending_operation_id = NULL, updated_at = $2 WHERE id = $3",
    )
    .bind(error)
    .bind(chrono::Utc::now())
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

fn select_query(suffix: &str) -> String {
    format!(
        r#"
        SELECT id, source_locale, target_locale, voice_kind, speaker_count,
               subtitle_max_chars, source_url, status, translation_id, iteration_id,
               iteration_number, pending_operation_id, resolved_source_url,
               output_media_url, output_source_subtitle_url, output_target_subtitle_url,
               output_metadata_url, validation, approval_requested_at, approval_decision,
               approval_reviewed_by, approval_reason, approval_decided_at,
               approval_automatic, error, created_at, updated_at
        FROM jobs
        {}
        "#,
        suffix
    )
}

fn status_to_string(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Submitted => "Submitted",
        JobStatus::Validating => "Validating",
        JobStatus::Translating => "Translating",
        JobStatus::AwaitingTranslation => "AwaitingTranslation",
        JobStatus::Iterating => "Iterating",
        JobStatus::AwaitingIteration => "AwaitingIteration",
        JobStatus::RunningValidation => "RunningValidation",
        JobStatus::PendingApproval => "PendingApproval",
        JobStatus::Approved => "Approved",
        JobStatus::Rejected => "Rejected",
        JobStatus::Completed => "Completed",
        JobStatus::Failed => "Failed",
    }
}

fn string_to_status(s: &str) -> JobStatus {
    match s {
        "Submitted" => JobStatus::Submitted,
        "Validating" => JobStatus::Validating,
        "Translating" => JobStatus::Translating,
        "AwaitingTranslation" => JobStatus::AwaitingTranslation,
        "Iterating" => JobStatus::Iterating,
        "AwaitingIteration" => JobStatus::AwaitingIteration,
        "RunningValidation" => JobStatus::RunningValidation,
        "PendingApproval" => JobStatus::PendingApproval,
        "Approved" => JobStatus::Approved,
        "Rejected" => JobStatus::Rejected,
        "Completed" => JobStatus::Completed,
        "Failed" => JobStatus::Failed,
        _ => JobStatus::Submitted,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    source_locale: String,
    target_locale: String,
    voice_kind: String,
    speaker_count: i32,
    subtitle_max_chars: Option<i32>,
    source_url: String,
    status: String,
    translation_id: Option<String>,
    iteration_id: Option<String>,
    iteration_number: i32,
    pending_operation_id: Option<String>,
    resolved_source_url: Option<String>,
    output_media_url: Option<String>,
    output_source_subtitle_url: Option<String>,
    output_target_subtitle_url: Option<String>,
    output_metadata_url: Option<String>,
    validation: Option<serde_json::Value>,
    approval_requested_at: Option<chrono::DateTime<chrono::Utc>>,
    approval_decision: Option<String>,
    approval_reviewed_by: Option<String>,
    approval_reason: Option<String>,
    approval_decided_at: Option<chrono::DateTime<chrono::Utc>>,
    approval_automatic: bool,
    error: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        let outputs = match (
            row.output_media_url,
            row.output_source_subtitle_url,
            row.output_target_subtitle_url,
            row.output_metadata_url,
        ) {
            (Some(media), Some(source), Some(target), Some(metadata)) => Some(JobOutputs {
                translated_media_url: media,
                source_subtitle_url: source,
                target_subtitle_url: target,
                metadata_url: metadata,
            }),
            _ => None,
        };

        let validation = row
            .validation
            .and_then(|v| serde_json::from_value::<ValidationOutcome>(v).ok());

        let approval = row.approval_requested_at.map(|requested_at| ApprovalState {
            requested_at,
            decision: row.approval_decision.as_deref().and_then(ApprovalDecision::parse),
            reviewed_by: row.approval_reviewed_by,
            reason: row.approval_reason,
            decided_at: row.approval_decided_at,
            automatic: row.approval_automatic,
        });

        Job {
            id: row.id,
            request: TranslationRequest {
                source_locale: row.source_locale,
                target_locale: row.target_locale,
                voice_kind: VoiceKind::parse(&row.voice_kind).unwrap_or(VoiceKind::PlatformVoice),
                speaker_count: row.speaker_count,
                subtitle_max_chars: row.subtitle_max_chars,
                source_url: row.source_url,
            },
            status: string_to_status(&row.status),
            translation_id: row.translation_id,
            iteration_id: row.iteration_id,
            iteration_number: row.iteration_number,
            pending_operation_id: row.pending_operation_id,
            resolved_source_url: row.resolved_source_url,
            outputs,
            validation,
            approval,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
