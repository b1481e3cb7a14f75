//! Job domain types
//!
//! A job is one end-to-end request to translate a media source from one
//! locale to another, including all re-iterations. The orchestrator is the
//! only writer of `status`; the store owns durability of the record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::approval::ApprovalState;
use crate::domain::validation::ValidationOutcome;

/// Media translation job record
///
/// Structure shared between the orchestrator (persists and mutates) and the
/// client/CLI (reads). Immutable once a terminal status is reached, except
/// for explicit re-iteration of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub request: TranslationRequest,
    pub status: JobStatus,
    /// Identifier of the provider-side translation, once submitted.
    pub translation_id: Option<String>,
    /// Identifier of the active provider-side iteration.
    pub iteration_id: Option<String>,
    /// Starts at 0; incremented by exactly 1 each time an iteration is created.
    pub iteration_number: i32,
    /// Operation identifier of a submission that has been checkpointed but
    /// not yet confirmed against the provider.
    pub pending_operation_id: Option<String>,
    /// Time-limited signed URL produced by input validation.
    pub resolved_source_url: Option<String>,
    pub outputs: Option<JobOutputs>,
    pub validation: Option<ValidationOutcome>,
    pub approval: Option<ApprovalState>,
    /// Last recorded failure; present only when `status` is `Failed`.
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Immutable snapshot of the original translation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub source_locale: String,
    pub target_locale: String,
    pub voice_kind: VoiceKind,
    pub speaker_count: i32,
    /// Maximum characters per subtitle segment, if constrained.
    pub subtitle_max_chars: Option<i32>,
    /// External URL or internal `container/path` reference to the media.
    pub source_url: String,
}

/// Voice synthesis strategy for the translated audio track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceKind {
    /// Stock platform voice matched to the target locale.
    PlatformVoice,
    /// Voice cloned from the source speaker.
    PersonalVoice,
}

impl VoiceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PlatformVoice" => Some(VoiceKind::PlatformVoice),
            "PersonalVoice" => Some(VoiceKind::PersonalVoice),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceKind::PlatformVoice => "PlatformVoice",
            VoiceKind::PersonalVoice => "PersonalVoice",
        }
    }
}

/// Workflow status of a job
///
/// Transitions are strictly sequential per job and validated by
/// [`JobStatus::can_transition_to`]. `Failed` is reachable from every
/// non-terminal state; a completed job may re-enter `Iterating` when a new
/// iteration is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Submitted,
    Validating,
    Translating,
    AwaitingTranslation,
    Iterating,
    AwaitingIteration,
    RunningValidation,
    PendingApproval,
    Approved,
    Rejected,
    Completed,
    Failed,
}

impl JobStatus {
    /// A terminal status admits no further automatic transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Rejected | JobStatus::Failed
        )
    }

    /// Whether the workflow driver should pick this job up and advance it.
    ///
    /// `PendingApproval` rests until a reviewer decision or the deadline
    /// sweep; terminal states rest forever.
    pub fn is_runnable(&self) -> bool {
        !self.is_terminal() && !matches!(self, JobStatus::PendingApproval)
    }

    /// Validates a status transition against the workflow state machine.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;

        // Any non-terminal job can be failed.
        if next == Failed && !self.is_terminal() {
            return true;
        }

        matches!(
            (self, next),
            (Submitted, Validating)
                | (Validating, Translating)
                | (Translating, AwaitingTranslation)
                | (AwaitingTranslation, Iterating)
                | (Iterating, AwaitingIteration)
                | (AwaitingIteration, RunningValidation)
                | (RunningValidation, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (Approved, Completed)
                // Re-iteration of a delivered job.
                | (Completed, Iterating)
        )
    }
}

/// Output references of a successful iteration
///
/// Non-null only once the active iteration succeeds; every URL is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutputs {
    pub translated_media_url: String,
    pub source_subtitle_url: String,
    pub target_subtitle_url: String,
    pub metadata_url: String,
}
