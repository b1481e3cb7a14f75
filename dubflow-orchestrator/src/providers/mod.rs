//! External collaborator interfaces
//!
//! The workflow engine only depends on these traits. Production
//! implementations speak HTTP via reqwest; tests use the in-memory fakes.
//!
//! All provider write operations take a caller-supplied unique operation
//! identifier. Submitting the same identifier twice is safe and returns the
//! original result; the engine's retry logic relies on this.

mod scoring;
mod storage;
mod translation;

pub use scoring::HttpScoringAgent;
pub use storage::HttpStorageClient;
pub use translation::HttpTranslationProvider;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use dubflow_core::domain::validation::{ReviewCategory, SpecialistReview};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::workflow::error::WorkflowError;

/// Parameters for creating a provider-side translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationParams {
    pub source_locale: String,
    pub target_locale: String,
    pub voice_kind: String,
    pub speaker_count: i32,
    pub source_media_url: String,
}

/// Parameters for creating one iteration within a translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationParams {
    pub subtitle_max_chars: Option<i32>,
}

/// Status of a provider-side translation operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationStatus {
    /// Provider status string; terminal iff exactly "succeeded" or "failed".
    pub status: String,
    pub error: Option<String>,
}

/// Status of a provider-side iteration, with result URLs once succeeded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationStatus {
    pub status: String,
    pub error: Option<String>,
    pub result: Option<IterationResult>,
}

/// Output URLs reported by a succeeded iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationResult {
    pub translated_media_url: String,
    pub source_subtitle_url: String,
    pub target_subtitle_url: String,
    pub metadata_url: String,
}

/// Common view over provider status payloads, used by the polling scheduler
pub trait RemoteStatus {
    fn state(&self) -> &str;
    fn failure_message(&self) -> Option<&str>;

    /// A status is terminal iff it is exactly "succeeded" or "failed"; all
    /// other statuses are transient.
    fn is_terminal(&self) -> bool {
        self.state() == "succeeded" || self.state() == "failed"
    }

    fn is_succeeded(&self) -> bool {
        self.state() == "succeeded"
    }
}

impl RemoteStatus for OperationStatus {
    fn state(&self) -> &str {
        &self.status
    }

    fn failure_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl RemoteStatus for IterationStatus {
    fn state(&self) -> &str {
        &self.status
    }

    fn failure_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Client for the external translation provider
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Submits a new translation. `operation_id` must be unique per attempt.
    async fn create_translation(
        &self,
        translation_id: &str,
        operation_id: &str,
        params: &TranslationParams,
    ) -> Result<OperationStatus, WorkflowError>;

    async fn get_translation(&self, translation_id: &str)
    -> Result<OperationStatus, WorkflowError>;

    /// Submits a new iteration under an existing translation.
    async fn create_iteration(
        &self,
        translation_id: &str,
        iteration_id: &str,
        operation_id: &str,
        params: &IterationParams,
    ) -> Result<OperationStatus, WorkflowError>;

    async fn get_iteration(
        &self,
        translation_id: &str,
        iteration_id: &str,
    ) -> Result<IterationStatus, WorkflowError>;
}

/// Client for the blob storage gateway
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Copies an external URL into `container/path`; idempotent for a fixed
    /// destination. Returns the stored blob URL.
    async fn copy_from_url(
        &self,
        source_url: &str,
        container: &str,
        path: &str,
    ) -> Result<String, WorkflowError>;

    /// Mints a time-limited signed URL for an existing blob.
    async fn generate_signed_url(
        &self,
        container: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, WorkflowError>;

    async fn exists(&self, container: &str, path: &str) -> Result<bool, WorkflowError>;

    /// Whether a URL is already a signed reference into our own storage.
    fn owns_url(&self, url: &str) -> bool;
}

/// Scoring request for one specialist category
#[derive(Debug, Clone, Serialize)]
pub struct ScoringRequest {
    pub category: ReviewCategory,
    pub source_subtitle_url: String,
    pub target_subtitle_url: String,
    pub source_locale: String,
    pub target_locale: String,
}

/// Client for the quality-scoring agent
///
/// Failures are non-fatal to the workflow; an unscored category is simply
/// excluded from aggregation.
#[async_trait]
pub trait ScoringAgent: Send + Sync {
    async fn score(&self, req: &ScoringRequest) -> Result<SpecialistReview, WorkflowError>;
}
