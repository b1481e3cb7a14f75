//! Workflow state machine
//!
//! Advances one job through its stages. Every externally-visible side
//! effect is bracketed by checkpoint writes: `record_pending_operation`
//! (status + identifiers, durably written before the provider call) and
//! `confirm_operation` (written after the provider accepts). Recovery after
//! a crash follows from the stored status alone:
//!
//! - a job past the confirm checkpoint resumes polling the recorded
//!   identifier and never re-submits;
//! - a job holding only a pending checkpoint re-submits with a freshly
//!   generated operation id (unique per attempt, so the provider never sees
//!   a conflicting duplicate).

use dubflow_core::domain::approval::ApprovalDecision;
use dubflow_core::domain::job::{Job, JobOutputs, JobStatus};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::providers::{
    IterationParams, IterationResult, ScoringAgent, StorageClient, TranslationParams,
    TranslationProvider,
};
use crate::repository::job_repository;
use crate::workflow::error::WorkflowError;
use crate::workflow::poll::{PollOutcome, PollPolicy, poll_until_terminal};
use crate::workflow::retry::{RetryPolicy, retry_with_backoff};
use crate::workflow::{scoring, validate};

/// Container where approved outputs are copied for permanent delivery.
const DELIVERY_CONTAINER: &str = "delivery";

/// Signed-URL validity for delivered outputs.
const DELIVERY_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Everything a workflow task needs to advance jobs
pub struct WorkflowContext {
    pub pool: PgPool,
    pub provider: Arc<dyn TranslationProvider>,
    pub storage: Arc<dyn StorageClient>,
    pub scoring: Arc<dyn ScoringAgent>,
    pub config: Config,
}

/// Steps a job until it reaches a rest state: PendingApproval or terminal.
///
/// Stage failures are recorded on the job (status Failed with the error
/// message); only database errors propagate to the caller.
pub async fn advance_to_rest(ctx: &WorkflowContext, job_id: Uuid) -> Result<(), WorkflowError> {
    loop {
        let Some(job) = job_repository::find_by_id(&ctx.pool, job_id).await? else {
            warn!("Job {} disappeared while being advanced", job_id);
            return Ok(());
        };

        if !job.status.is_runnable() {
            return Ok(());
        }

        match advance_once(ctx, &job).await {
            Ok(()) => continue,
            Err(WorkflowError::Database(e)) => return Err(WorkflowError::Database(e)),
            Err(e) => {
                error!("Job {} failed in {:?}: {}", job_id, job.status, e);
                job_repository::set_failed(&ctx.pool, job_id, &e.to_string()).await?;
                return Ok(());
            }
        }
    }
}

/// Executes exactly one stage of the state machine.
async fn advance_once(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    match job.status {
        JobStatus::Submitted => {
            job_repository::checkpoint_status(&ctx.pool, job.id, JobStatus::Validating).await?;
            Ok(())
        }
        JobStatus::Validating => run_validation_stage(ctx, job).await,
        JobStatus::Translating => submit_translation(ctx, job).await,
        JobStatus::AwaitingTranslation => await_translation(ctx, job).await,
        JobStatus::Iterating => submit_iteration(ctx, job).await,
        JobStatus::AwaitingIteration => await_iteration(ctx, job).await,
        JobStatus::RunningValidation => run_scoring_stage(ctx, job).await,
        JobStatus::Approved => finalize_delivery(ctx, job).await,
        // Rest states; the driver should not hand these to us.
        JobStatus::PendingApproval
        | JobStatus::Rejected
        | JobStatus::Completed
        | JobStatus::Failed => Ok(()),
    }
}

/// Validating: check the request, resolve the media source, and checkpoint
/// the upcoming translation submission.
async fn run_validation_stage(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    let resolved = validate::resolve_request(ctx.storage.as_ref(), job.id, &job.request).await?;
    job_repository::set_resolved_source(&ctx.pool, job.id, &resolved).await?;

    // Translation id is deterministic per job, so a crash here re-derives
    // the same provider-side identity.
    let translation_id = job
        .translation_id
        .clone()
        .unwrap_or_else(|| format!("trn-{}", job.id.simple()));

    job_repository::record_pending_operation(
        &ctx.pool,
        job.id,
        JobStatus::Translating,
        &translation_id,
        None,
        None,
        &new_operation_id(),
    )
    .await?;

    info!("Job {} validated, source resolved", job.id);
    Ok(())
}

/// Translating: submit the translation, retrying transient errors with a
/// fresh operation id per attempt.
async fn submit_translation(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    let translation_id = job
        .translation_id
        .clone()
        .ok_or_else(|| WorkflowError::Validation("job has no translation id".to_string()))?;
    let resolved_source = job.resolved_source_url.clone().ok_or_else(|| {
        WorkflowError::Validation("job has no resolved source url".to_string())
    })?;

    let params = TranslationParams {
        source_locale: job.request.source_locale.clone(),
        target_locale: job.request.target_locale.clone(),
        voice_kind: job.request.voice_kind.as_str().to_string(),
        speaker_count: job.request.speaker_count,
        source_media_url: resolved_source,
    };

    let retry = RetryPolicy::from_config(&ctx.config);
    let job_id = job.id;

    retry_with_backoff(&retry, || {
        let pool = ctx.pool.clone();
        let provider = Arc::clone(&ctx.provider);
        let translation_id = translation_id.clone();
        let params = params.clone();
        async move {
            let operation_id = new_operation_id();
            job_repository::record_pending_operation(
                &pool,
                job_id,
                JobStatus::Translating,
                &translation_id,
                None,
                None,
                &operation_id,
            )
            .await?;
            provider
                .create_translation(&translation_id, &operation_id, &params)
                .await
        }
    })
    .await?;

    job_repository::confirm_operation(&ctx.pool, job.id, JobStatus::AwaitingTranslation).await?;

    info!("Job {} translation {} submitted", job.id, translation_id);
    Ok(())
}

/// AwaitingTranslation: poll the provider until the translation container
/// is ready, then checkpoint the first (or next) iteration.
async fn await_translation(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    let translation_id = job
        .translation_id
        .clone()
        .ok_or_else(|| WorkflowError::Validation("job has no translation id".to_string()))?;

    let policy = PollPolicy::from_config(&ctx.config);
    let job_id = job.id;

    let outcome = poll_until_terminal(&policy, || {
        let pool = ctx.pool.clone();
        let provider = Arc::clone(&ctx.provider);
        let translation_id = translation_id.clone();
        async move {
            job_repository::touch(&pool, job_id).await?;
            provider.get_translation(&translation_id).await
        }
    })
    .await?;

    match outcome {
        PollOutcome::Succeeded(_) => {
            job_repository::checkpoint_status(&ctx.pool, job.id, JobStatus::Iterating).await?;
            Ok(())
        }
        PollOutcome::Failed(message) => Err(WorkflowError::ProviderFailure(message)),
    }
}

/// Iterating: assign the next iteration identity (or resume the
/// checkpointed one) and submit it.
async fn submit_iteration(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    let translation_id = job
        .translation_id
        .clone()
        .ok_or_else(|| WorkflowError::Validation("job has no translation id".to_string()))?;

    let (iteration_number, iteration_id) = iteration_identity(job);

    let params = IterationParams {
        subtitle_max_chars: job.request.subtitle_max_chars,
    };

    let retry = RetryPolicy::from_config(&ctx.config);
    let job_id = job.id;

    retry_with_backoff(&retry, || {
        let pool = ctx.pool.clone();
        let provider = Arc::clone(&ctx.provider);
        let translation_id = translation_id.clone();
        let iteration_id = iteration_id.clone();
        let params = params.clone();
        async move {
            let operation_id = new_operation_id();
            job_repository::record_pending_operation(
                &pool,
                job_id,
                JobStatus::Iterating,
                &translation_id,
                Some(&iteration_id),
                Some(iteration_number),
                &operation_id,
            )
            .await?;
            provider
                .create_iteration(&translation_id, &iteration_id, &operation_id, &params)
                .await
        }
    })
    .await?;

    job_repository::confirm_operation(&ctx.pool, job.id, JobStatus::AwaitingIteration).await?;

    info!(
        "Job {} iteration {} ({}) submitted",
        job.id, iteration_number, iteration_id
    );
    Ok(())
}

/// AwaitingIteration: poll until the iteration finishes and capture the
/// output URLs.
async fn await_iteration(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    let translation_id = job
        .translation_id
        .clone()
        .ok_or_else(|| WorkflowError::Validation("job has no translation id".to_string()))?;
    let iteration_id = job
        .iteration_id
        .clone()
        .ok_or_else(|| WorkflowError::Validation("job has no iteration id".to_string()))?;

    let policy = PollPolicy::from_config(&ctx.config);
    let job_id = job.id;

    let outcome = poll_until_terminal(&policy, || {
        let pool = ctx.pool.clone();
        let provider = Arc::clone(&ctx.provider);
        let translation_id = translation_id.clone();
        let iteration_id = iteration_id.clone();
        async move {
            job_repository::touch(&pool, job_id).await?;
            provider.get_iteration(&translation_id, &iteration_id).await
        }
    })
    .await?;

    match outcome {
        PollOutcome::Succeeded(status) => {
            let result = status.result.ok_or_else(|| {
                WorkflowError::ProviderFailure(
                    "iteration succeeded without result URLs".to_string(),
                )
            })?;

            let outputs = outputs_from_result(result)?;

            job_repository::set_outputs(&ctx.pool, job.id, &outputs).await?;
            job_repository::checkpoint_status(&ctx.pool, job.id, JobStatus::RunningValidation)
                .await?;

            info!("Job {} iteration {} succeeded", job.id, iteration_id);
            Ok(())
        }
        PollOutcome::Failed(message) => Err(WorkflowError::ProviderFailure(message)),
    }
}

/// RunningValidation: score the outputs (non-fatal on agent outage), attach
/// the outcome, and open the approval gate.
async fn run_scoring_stage(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    let outputs = job
        .outputs
        .clone()
        .ok_or_else(|| WorkflowError::Validation("job has no outputs to validate".to_string()))?;

    let outcome = scoring::run_validation(ctx.scoring.as_ref(), job, &outputs).await;
    let scored = outcome.is_scored();

    job_repository::set_validation(&ctx.pool, job.id, &outcome).await?;
    job_repository::open_approval_gate(&ctx.pool, job.id).await?;

    if !scored && ctx.config.reject_unscored {
        let applied = job_repository::record_decision(
            &ctx.pool,
            job.id,
            ApprovalDecision::Rejected,
            None,
            Some("no validation score available"),
            true,
        )
        .await?;
        if applied {
            info!("Job {} auto-rejected: unscored", job.id);
        }
        return Ok(());
    }

    info!("Job {} awaiting approval", job.id);
    Ok(())
}

/// Approved: copy outputs into permanent delivery storage and complete.
async fn finalize_delivery(ctx: &WorkflowContext, job: &Job) -> Result<(), WorkflowError> {
    let outputs = job
        .outputs
        .clone()
        .ok_or_else(|| WorkflowError::Validation("approved job has no outputs".to_string()))?;

    let delivered = deliver_outputs(ctx.storage.as_ref(), job.id, &outputs).await?;

    job_repository::set_outputs(&ctx.pool, job.id, &delivered).await?;
    job_repository::checkpoint_status(&ctx.pool, job.id, JobStatus::Completed).await?;

    info!("Job {} completed, outputs delivered", job.id);
    Ok(())
}

/// Copies each output into the delivery container and re-signs it.
/// Destination paths are deterministic per job, so a crashed copy pass can
/// safely run again.
async fn deliver_outputs(
    storage: &dyn StorageClient,
    job_id: Uuid,
    outputs: &JobOutputs,
) -> Result<JobOutputs, WorkflowError> {
    Ok(JobOutputs {
        translated_media_url: deliver_one(
            storage,
            job_id,
            &outputs.translated_media_url,
            "video.mp4",
        )
        .await?,
        source_subtitle_url: deliver_one(
            storage,
            job_id,
            &outputs.source_subtitle_url,
            "source.vtt",
        )
        .await?,
        target_subtitle_url: deliver_one(
            storage,
            job_id,
            &outputs.target_subtitle_url,
            "target.vtt",
        )
        .await?,
        metadata_url: deliver_one(storage, job_id, &outputs.metadata_url, "metadata.json").await?,
    })
}

async fn deliver_one(
    storage: &dyn StorageClient,
    job_id: Uuid,
    source_url: &str,
    name: &str,
) -> Result<String, WorkflowError> {
    let path = format!("{}/{}", job_id, name);
    storage
        .copy_from_url(source_url, DELIVERY_CONTAINER, &path)
        .await?;
    storage
        .generate_signed_url(DELIVERY_CONTAINER, &path, DELIVERY_TTL)
        .await
}

/// Converts a provider-reported iteration result into stored outputs.
/// Every URL must be non-empty; a result with a missing URL is a provider
/// failure, not a completed iteration.
fn outputs_from_result(result: IterationResult) -> Result<JobOutputs, WorkflowError> {
    let outputs = JobOutputs {
        translated_media_url: result.translated_media_url,
        source_subtitle_url: result.source_subtitle_url,
        target_subtitle_url: result.target_subtitle_url,
        metadata_url: result.metadata_url,
    };

    if outputs.translated_media_url.is_empty()
        || outputs.source_subtitle_url.is_empty()
        || outputs.target_subtitle_url.is_empty()
        || outputs.metadata_url.is_empty()
    {
        return Err(WorkflowError::ProviderFailure(
            "iteration result contains an empty output URL".to_string(),
        ));
    }

    Ok(outputs)
}

/// Picks the iteration identity for a job entering Iterating.
///
/// A checkpointed iteration whose submission never confirmed is resumed
/// as-is; otherwise the iteration number increments by exactly one and the
/// identifier is derived from it.
fn iteration_identity(job: &Job) -> (i32, String) {
    match (&job.iteration_id, &job.pending_operation_id) {
        (Some(id), Some(_)) => (job.iteration_number, id.clone()),
        _ => {
            let next = job.iteration_number + 1;
            (next, format!("it-{:03}", next))
        }
    }
}

/// Fresh unique operation identifier; one per submission attempt.
fn new_operation_id() -> String {
    format!("op-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fake::{FakeStorageClient, FakeTranslationProvider};
    use dubflow_core::domain::job::{TranslationRequest, VoiceKind};

    fn iteration_result() -> IterationResult {
        IterationResult {
            translated_media_url: "https://provider.example/r/video.mp4".to_string(),
            source_subtitle_url: "https://provider.example/r/source.vtt".to_string(),
            target_subtitle_url: "https://provider.example/r/target.vtt".to_string(),
            metadata_url: "https://provider.example/r/metadata.json".to_string(),
        }
    }

    fn job_at(status: JobStatus) -> Job {
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
            iteration_id: None,
            iteration_number: 0,
            pending_operation_id: None,
            resolved_source_url: None,
            outputs: None,
            validation: None,
            approval: None,
            error: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_first_iteration_is_number_one() {
        let job = job_at(JobStatus::Iterating);
        assert_eq!(iteration_identity(&job), (1, "it-001".to_string()));
    }

    #[test]
    fn test_reiteration_increments_by_exactly_one() {
        // After a completed job re-enters Iterating the previous iteration
        // id is cleared but the number is kept.
        let mut job = job_at(JobStatus::Iterating);
        job.iteration_number = 3;

        assert_eq!(iteration_identity(&job), (4, "it-004".to_string()));
    }

    #[test]
    fn test_unconfirmed_iteration_is_resumed_not_renumbered() {
        let mut job = job_at(JobStatus::Iterating);
        job.iteration_number = 2;
        job.iteration_id = Some("it-002".to_string());
        job.pending_operation_id = Some("op-abc".to_string());

        assert_eq!(iteration_identity(&job), (2, "it-002".to_string()));
    }

    #[test]
    fn test_confirmed_iteration_gets_a_new_number() {
        let mut job = job_at(JobStatus::Iterating);
        job.iteration_number = 2;
        job.iteration_id = Some("it-002".to_string());

        assert_eq!(iteration_identity(&job), (3, "it-003".to_string()));
    }

    #[test]
    fn test_complete_iteration_result_accepted() {
        let outputs = outputs_from_result(iteration_result()).unwrap();
        assert_eq!(
            outputs.metadata_url,
            "https://provider.example/r/metadata.json"
        );
    }

    #[test]
    fn test_empty_output_url_is_provider_failure() {
        let mut result = iteration_result();
        result.target_subtitle_url = String::new();

        let err = outputs_from_result(result).unwrap_err();
        assert!(matches!(err, WorkflowError::ProviderFailure(_)));
    }

    #[tokio::test]
    async fn test_approved_outputs_land_on_permanent_paths() {
        let storage = FakeStorageClient::new();
        let job_id = Uuid::new_v4();
        let outputs = outputs_from_result(iteration_result()).unwrap();

        let delivered = deliver_outputs(&storage, job_id, &outputs).await.unwrap();

        assert!(
            delivered
                .translated_media_url
                .contains(&format!("delivery/{}/video.mp4", job_id))
        );
        assert!(
            delivered
                .metadata_url
                .contains(&format!("delivery/{}/metadata.json", job_id))
        );
        assert!(
            delivered
                .translated_media_url
                .contains(&format!("ttl={}", DELIVERY_TTL.as_secs()))
        );
        assert_eq!(storage.copies().len(), 4);
    }

    #[tokio::test]
    async fn test_delivery_retry_hits_the_same_destinations() {
        let storage = FakeStorageClient::new();
        let job_id = Uuid::new_v4();
        let outputs = outputs_from_result(iteration_result()).unwrap();

        let first = deliver_outputs(&storage, job_id, &outputs).await.unwrap();
        let second = deliver_outputs(&storage, job_id, &outputs).await.unwrap();

        assert_eq!(first.translated_media_url, second.translated_media_url);
        assert_eq!(first.metadata_url, second.metadata_url);

        // Same four destination paths on both passes.
        let copies = storage.copies();
        assert_eq!(copies.len(), 8);
        for i in 0..4 {
            assert_eq!(copies[i].2, copies[i + 4].2);
        }
    }

    #[test]
    fn test_operation_ids_are_unique_per_attempt() {
        let a = new_operation_id();
        let b = new_operation_id();
        assert_ne!(a, b);
        assert!(a.starts_with("op-"));
    }

    #[tokio::test]
    async fn test_provider_idempotence_law() {
        // Re-submitting the same operation identifier never produces two
        // distinct provider-side jobs.
        let provider = FakeTranslationProvider::new();
        let params = TranslationParams {
            source_locale: "en-US".to_string(),
            target_locale: "fr-FR".to_string(),
            voice_kind: "PlatformVoice".to_string(),
            speaker_count: 1,
            source_media_url: "https://media.dubflow.local/intake/a/source.mp4?sig=x".to_string(),
        };

        let first = provider
            .create_translation("trn-a", "op-1", &params)
            .await
            .unwrap();
        let second = provider
            .create_translation("trn-a", "op-1", &params)
            .await
            .unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(provider.translation_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_operation_is_retried_with_new_id() {
        let provider = FakeTranslationProvider::new();
        provider.inject_conflict("op-conflicted");

        let params = IterationParams {
            subtitle_max_chars: None,
        };

        let err = provider
            .create_iteration("trn-a", "it-001", "op-conflicted", &params)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.needs_new_operation_id());

        // A fresh id succeeds against the same iteration.
        provider
            .create_iteration("trn-a", "it-001", &new_operation_id(), &params)
            .await
            .unwrap();
        assert_eq!(provider.iteration_count(), 1);
    }
}
