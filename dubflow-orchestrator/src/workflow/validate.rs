//! Input validation and media source resolution
//!
//! Checks the request against the supported-locale set and resolves the
//! media reference into a time-limited signed URL the translation provider
//! can read. The copy destination is deterministic per job, so a retried
//! resolution lands on the same blob.

use dubflow_core::domain::job::TranslationRequest;
use std::time::Duration;
use uuid::Uuid;

use crate::providers::StorageClient;
use crate::workflow::error::WorkflowError;

/// Locales the translation provider supports, source or target.
pub const SUPPORTED_LOCALES: [&str; 14] = [
    "en-US", "en-GB", "es-ES", "es-MX", "fr-FR", "de-DE", "it-IT", "pt-BR", "ja-JP", "ko-KR",
    "zh-CN", "hi-IN", "ar-SA", "ru-RU",
];

/// Container external sources are copied into.
const INTAKE_CONTAINER: &str = "intake";

/// Signed-URL validity for a freshly copied external source.
const EXTERNAL_COPY_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Signed-URL validity for a pre-existing internal path.
const INTERNAL_REF_TTL: Duration = Duration::from_secs(2 * 60 * 60);

pub fn is_supported_locale(locale: &str) -> bool {
    SUPPORTED_LOCALES.contains(&locale)
}

/// Validates the locale pair and request parameters.
pub fn validate_request(request: &TranslationRequest) -> Result<(), WorkflowError> {
    if !is_supported_locale(&request.source_locale) {
        return Err(WorkflowError::Validation(format!(
            "UnsupportedLocale: source locale '{}' is not supported",
            request.source_locale
        )));
    }

    if !is_supported_locale(&request.target_locale) {
        return Err(WorkflowError::Validation(format!(
            "UnsupportedLocale: target locale '{}' is not supported",
            request.target_locale
        )));
    }

    if request.source_locale == request.target_locale {
        return Err(WorkflowError::Validation(format!(
            "UnsupportedLocale: source and target locale are both '{}'",
            request.source_locale
        )));
    }

    if request.speaker_count < 1 {
        return Err(WorkflowError::Validation(format!(
            "speaker_count must be at least 1, got {}",
            request.speaker_count
        )));
    }

    Ok(())
}

/// Validates the request and resolves its media source to a signed URL.
pub async fn resolve_request(
    storage: &dyn StorageClient,
    job_id: Uuid,
    request: &TranslationRequest,
) -> Result<String, WorkflowError> {
    validate_request(request)?;
    resolve_source(storage, job_id, &request.source_url).await
}

/// Resolves a media reference:
/// - a signed URL into our own storage is used as-is;
/// - an internal `container/path` reference is checked for existence and
///   signed for 2 hours;
/// - any other external URL is copied into the intake container and signed
///   for 4 hours.
async fn resolve_source(
    storage: &dyn StorageClient,
    job_id: Uuid,
    source_url: &str,
) -> Result<String, WorkflowError> {
    if storage.owns_url(source_url) {
        return Ok(source_url.to_string());
    }

    if !source_url.starts_with("http://") && !source_url.starts_with("https://") {
        // Internal container/path reference.
        let (container, path) = source_url.split_once('/').ok_or_else(|| {
            WorkflowError::Validation(format!(
                "SourceNotFound: malformed internal reference '{}'",
                source_url
            ))
        })?;

        if !storage.exists(container, path).await? {
            return Err(WorkflowError::Validation(format!(
                "SourceNotFound: internal path '{}' does not exist",
                source_url
            )));
        }

        return storage
            .generate_signed_url(container, path, INTERNAL_REF_TTL)
            .await;
    }

    let destination = intake_path(job_id, source_url);

    storage
        .copy_from_url(source_url, INTAKE_CONTAINER, &destination)
        .await
        .map_err(|e| {
            WorkflowError::Validation(format!("SourceResolutionFailed: {}", e))
        })?;

    storage
        .generate_signed_url(INTAKE_CONTAINER, &destination, EXTERNAL_COPY_TTL)
        .await
}

/// Deterministic per-job destination path for a copied external source.
fn intake_path(job_id: Uuid, source_url: &str) -> String {
    format!("{}/source.{}", job_id, media_extension(source_url))
}

fn media_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= 4 && !ext.contains('/') => ext,
        _ => "mp4",
    }
}
