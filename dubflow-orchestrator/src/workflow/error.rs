//! Workflow error taxonomy
//!
//! Classifies every failure the engine can observe so the retry policy can
//! be applied uniformly: validation errors are never retried, transient
//! provider errors are retried with backoff, and scoring failures are
//! non-fatal to the workflow.

use thiserror::Error;

/// Errors that can occur while advancing a workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Bad input; the job fails immediately and is never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network failure or 5xx-class provider error; retried with backoff.
    #[error("transient provider error: {0}")]
    TransientProvider(String),

    /// The provider reported the operation itself as failed.
    #[error("provider reported failure: {0}")]
    ProviderFailure(String),

    /// The polling wait ceiling was exceeded before a terminal status.
    #[error("polling timed out after {0} seconds")]
    PollingTimeout(u64),

    /// The scoring agent could not produce a score; non-fatal.
    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(String),

    /// A second decision was submitted for an already-decided approval gate.
    #[error("approval already decided")]
    AlreadyDecided,

    /// The provider rejected an operation id as conflicting. Should not
    /// occur given per-attempt id uniqueness; treated as transient and
    /// retried with a freshly generated id.
    #[error("duplicate operation id: {0}")]
    DuplicateOperation(String),

    /// Storage gateway failure during copy or signing.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl WorkflowError {
    /// Whether the submission retry loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkflowError::TransientProvider(_) | WorkflowError::DuplicateOperation(_)
        )
    }

    /// Whether a fresh operation identifier must be generated before the
    /// next attempt.
    pub fn needs_new_operation_id(&self) -> bool {
        matches!(self, WorkflowError::DuplicateOperation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(WorkflowError::TransientProvider("503".into()).is_retryable());
        assert!(WorkflowError::DuplicateOperation("op-1".into()).is_retryable());
        assert!(!WorkflowError::Validation("bad locale".into()).is_retryable());
        assert!(!WorkflowError::ProviderFailure("codec".into()).is_retryable());
        assert!(!WorkflowError::PollingTimeout(3600).is_retryable());
    }

    #[test]
    fn test_duplicate_operation_requires_new_id() {
        assert!(WorkflowError::DuplicateOperation("op-1".into()).needs_new_operation_id());
        assert!(!WorkflowError::TransientProvider("503".into()).needs_new_operation_id());
    }
}
