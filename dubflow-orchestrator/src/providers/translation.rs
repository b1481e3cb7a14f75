//! HTTP translation provider client
//!
//! Thin reqwest wrapper over the provider's REST API. The unique operation
//! identifier travels in the `Operation-Id` header; a 409 from the provider
//! means the identifier conflicted with an earlier, different submission.

use async_trait::async_trait;
use reqwest::Client;

use crate::providers::{
    IterationParams, IterationStatus, OperationStatus, TranslationParams, TranslationProvider,
};
use crate::workflow::error::WorkflowError;

pub struct HttpTranslationProvider {
    base_url: String,
    client: Client,
}

impl HttpTranslationProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    async fn handle_status_response(
        &self,
        response: reqwest::Response,
        operation_id: Option<&str>,
    ) -> Result<reqwest::Response, WorkflowError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status.as_u16() == 409 {
            if let Some(op) = operation_id {
                return Err(WorkflowError::DuplicateOperation(op.to_string()));
            }
        }

        if status.is_server_error() {
            return Err(WorkflowError::TransientProvider(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        Err(WorkflowError::ProviderFailure(format!(
            "provider returned {}: {}",
            status, body
        )))
    }
}

fn request_error(e: reqwest::Error) -> WorkflowError {
    WorkflowError::TransientProvider(format!("request failed: {}", e))
}

fn parse_error(e: reqwest::Error) -> WorkflowError {
    WorkflowError::ProviderFailure(format!("failed to parse provider response: {}", e))
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    async fn create_translation(
        &self,
        translation_id: &str,
        operation_id: &str,
        params: &TranslationParams,
    ) -> Result<OperationStatus, WorkflowError> {
        let url = format!("{}/translations/{}", self.base_url, translation_id);
        let response = self
            .client
            .put(&url)
            .header("Operation-Id", operation_id)
            .json(params)
            .send()
            .await
            .map_err(request_error)?;

        let response = self
            .handle_status_response(response, Some(operation_id))
            .await?;
        response.json().await.map_err(parse_error)
    }

    async fn get_translation(
        &self,
        translation_id: &str,
    ) -> Result<OperationStatus, WorkflowError> {
        let url = format!("{}/translations/{}", self.base_url, translation_id);
        let response = self.client.get(&url).send().await.map_err(request_error)?;

        let response = self.handle_status_response(response, None).await?;
        response.json().await.map_err(parse_error)
    }

    async fn create_iteration(
        &self,
        translation_id: &str,
        iteration_id: &str,
        operation_id: &str,
        params: &IterationParams,
    ) -> Result<OperationStatus, WorkflowError> {
        let url = format!(
            "{}/translations/{}/iterations/{}",
            self.base_url, translation_id, iteration_id
        );
        let response = self
            .client
            .put(&url)
            .header("Operation-Id", operation_id)
            .json(params)
            .send()
            .await
            .map_err(request_error)?;

        let response = self
            .handle_status_response(response, Some(operation_id))
            .await?;
        response.json().await.map_err(parse_error)
    }

    async fn get_iteration(
        &self,
        translation_id: &str,
        iteration_id: &str,
    ) -> Result<IterationStatus, WorkflowError> {
        let url = format!(
            "{}/translations/{}/iterations/{}",
            self.base_url, translation_id, iteration_id
        );
        let response = self.client.get(&url).send().await.map_err(request_error)?;

        let response = self.handle_status_response(response, None).await?;
        response.json().await.map_err(parse_error)
    }
}
