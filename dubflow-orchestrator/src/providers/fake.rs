//! In-memory fakes of the external collaborators
//!
//! Used by workflow unit tests. The fake provider implements the same
//! operation-id idempotence law as the real one: re-submitting a previously
//! seen operation id returns the original result without registering new
//! provider-side work.

use async_trait::async_trait;
use dubflow_core::domain::validation::{ReviewCategory, SpecialistReview};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::providers::{
    IterationParams, IterationStatus, OperationStatus, ScoringAgent, ScoringRequest,
    StorageClient, TranslationParams, TranslationProvider,
};
use crate::workflow::error::WorkflowError;

// =============================================================================
// Translation provider
// =============================================================================

#[derive(Default)]
struct FakeProviderState {
    /// operation_id -> original result, replayed on duplicate submission.
    operations: HashMap<String, OperationStatus>,
    translations: HashSet<String>,
    iterations: HashSet<(String, String)>,
    translation_statuses: HashMap<String, VecDeque<OperationStatus>>,
    iteration_statuses: HashMap<String, VecDeque<IterationStatus>>,
    transient_failures_remaining: u32,
    conflicting_operation_ids: HashSet<String>,
}

#[derive(Default)]
pub struct FakeTranslationProvider {
    state: Mutex<FakeProviderState>,
}

impl FakeTranslationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the status sequence returned by successive polls of a
    /// translation. The last status repeats once the script is exhausted.
    pub fn script_translation(&self, translation_id: &str, statuses: Vec<OperationStatus>) {
        let mut state = self.state.lock().unwrap();
        state
            .translation_statuses
            .insert(translation_id.to_string(), statuses.into());
    }

    pub fn script_iteration(&self, iteration_id: &str, statuses: Vec<IterationStatus>) {
        let mut state = self.state.lock().unwrap();
        state
            .iteration_statuses
            .insert(iteration_id.to_string(), statuses.into());
    }

    /// Makes the next `n` create calls fail with a transient error.
    pub fn inject_transient_failures(&self, n: u32) {
        self.state.lock().unwrap().transient_failures_remaining = n;
    }

    /// Marks an operation id as conflicting on the provider side.
    pub fn inject_conflict(&self, operation_id: &str) {
        self.state
            .lock()
            .unwrap()
            .conflicting_operation_ids
            .insert(operation_id.to_string());
    }

    /// Number of distinct translations registered with the provider.
    pub fn translation_count(&self) -> usize {
        self.state.lock().unwrap().translations.len()
    }

    pub fn iteration_count(&self) -> usize {
        self.state.lock().unwrap().iterations.len()
    }

    fn check_create(
        state: &mut FakeProviderState,
        operation_id: &str,
    ) -> Option<Result<OperationStatus, WorkflowError>> {
        if let Some(original) = state.operations.get(operation_id) {
            // Idempotent replay of a previously seen operation id.
            return Some(Ok(original.clone()));
        }

        if state.conflicting_operation_ids.contains(operation_id) {
            return Some(Err(WorkflowError::DuplicateOperation(
                operation_id.to_string(),
            )));
        }

        if state.transient_failures_remaining > 0 {
            state.transient_failures_remaining -= 1;
            return Some(Err(WorkflowError::TransientProvider(
                "injected 503".to_string(),
            )));
        }

        None
    }
}

fn running() -> OperationStatus {
    OperationStatus {
        status: "running".to_string(),
        error: None,
    }
}

#[async_trait]
impl TranslationProvider for FakeTranslationProvider {
    async fn create_translation(
        &self,
        translation_id: &str,
        operation_id: &str,
        _params: &TranslationParams,
    ) -> Result<OperationStatus, WorkflowError> {
        let mut state = self.state.lock().unwrap();

        if let Some(outcome) = Self::check_create(&mut state, operation_id) {
            return outcome;
        }

        state.translations.insert(translation_id.to_string());
        let status = running();
        state
            .operations
            .insert(operation_id.to_string(), status.clone());
        Ok(status)
    }

    async fn get_translation(
        &self,
        translation_id: &str,
    ) -> Result<OperationStatus, WorkflowError> {
        let mut state = self.state.lock().unwrap();
        let status = match state.translation_statuses.get_mut(translation_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(running),
            None => running(),
        };
        Ok(status)
    }

    async fn create_iteration(
        &self,
        translation_id: &str,
        iteration_id: &str,
        operation_id: &str,
        _params: &IterationParams,
    ) -> Result<OperationStatus, WorkflowError> {
        let mut state = self.state.lock().unwrap();

        if let Some(outcome) = Self::check_create(&mut state, operation_id) {
            return outcome;
        }

        state
            .iterations
            .insert((translation_id.to_string(), iteration_id.to_string()));
        let status = running();
        state
            .operations
            .insert(operation_id.to_string(), status.clone());
        Ok(status)
    }

    async fn get_iteration(
        &self,
        _translation_id: &str,
        iteration_id: &str,
    ) -> Result<IterationStatus, WorkflowError> {
        let mut state = self.state.lock().unwrap();
        let status = match state.iteration_statuses.get_mut(iteration_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(IterationStatus {
                status: "running".to_string(),
                error: None,
                result: None,
            }),
            None => IterationStatus {
                status: "running".to_string(),
                error: None,
                result: None,
            },
        };
        Ok(status)
    }
}

// =============================================================================
// Storage
// =============================================================================

#[derive(Default)]
struct FakeStorageState {
    existing: HashSet<(String, String)>,
    copies: Vec<(String, String, String)>,
    fail_copies: bool,
}

pub struct FakeStorageClient {
    public_host: String,
    state: Mutex<FakeStorageState>,
}

impl FakeStorageClient {
    pub fn new() -> Self {
        Self {
            public_host: "media.dubflow.local".to_string(),
            state: Mutex::new(FakeStorageState::default()),
        }
    }

    pub fn seed_blob(&self, container: &str, path: &str) {
        self.state
            .lock()
            .unwrap()
            .existing
            .insert((container.to_string(), path.to_string()));
    }

    pub fn fail_copies(&self) {
        self.state.lock().unwrap().fail_copies = true;
    }

    /// Recorded (source_url, container, path) copy calls.
    pub fn copies(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().copies.clone()
    }

    fn signed(&self, container: &str, path: &str, ttl: Duration) -> String {
        format!(
            "https://{}/{}/{}?sig=fake&ttl={}",
            self.public_host,
            container,
            path,
            ttl.as_secs()
        )
    }
}

#[async_trait]
impl StorageClient for FakeStorageClient {
    async fn copy_from_url(
        &self,
        source_url: &str,
        container: &str,
        path: &str,
    ) -> Result<String, WorkflowError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_copies {
            return Err(WorkflowError::Storage("injected copy failure".to_string()));
        }

        state.copies.push((
            source_url.to_string(),
            container.to_string(),
            path.to_string(),
        ));
        state
            .existing
            .insert((container.to_string(), path.to_string()));
        Ok(format!("https://{}/{}/{}", self.public_host, container, path))
    }

    async fn generate_signed_url(
        &self,
        container: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, WorkflowError> {
        Ok(self.signed(container, path, ttl))
    }

    async fn exists(&self, container: &str, path: &str) -> Result<bool, WorkflowError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .existing
            .contains(&(container.to_string(), path.to_string())))
    }

    fn owns_url(&self, url: &str) -> bool {
        url.contains(&self.public_host) && url.contains("sig=")
    }
}

// =============================================================================
// Scoring
// =============================================================================

pub struct FakeScoringAgent {
    responses: Mutex<HashMap<ReviewCategory, Result<SpecialistReview, String>>>,
}

impl FakeScoringAgent {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_score(&self, category: ReviewCategory, review: SpecialistReview) {
        self.responses
            .lock()
            .unwrap()
            .insert(category, Ok(review));
    }

    pub fn set_unavailable(&self, category: ReviewCategory) {
        self.responses
            .lock()
            .unwrap()
            .insert(category, Err("injected outage".to_string()));
    }
}

#[async_trait]
impl ScoringAgent for FakeScoringAgent {
    async fn score(&self, req: &ScoringRequest) -> Result<SpecialistReview, WorkflowError> {
        match self.responses.lock().unwrap().get(&req.category) {
            Some(Ok(review)) => Ok(review.clone()),
            Some(Err(msg)) => Err(WorkflowError::ScoringUnavailable(msg.clone())),
            None => Err(WorkflowError::ScoringUnavailable(
                "no scripted response".to_string(),
            )),
        }
    }
}
