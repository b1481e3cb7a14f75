//! HTTP scoring agent client
//!
//! Every failure is mapped to `ScoringUnavailable`; the caller treats an
//! unscored category as excluded from aggregation rather than fatal.

use async_trait::async_trait;
use dubflow_core::domain::validation::SpecialistReview;
use reqwest::Client;

use crate::providers::{ScoringAgent, ScoringRequest};
use crate::workflow::error::WorkflowError;

pub struct HttpScoringAgent {
    base_url: String,
    client: Client,
}

impl HttpScoringAgent {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ScoringAgent for HttpScoringAgent {
    async fn score(&self, req: &ScoringRequest) -> Result<SpecialistReview, WorkflowError> {
        let url = format!("{}/score", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(|e| WorkflowError::ScoringUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WorkflowError::ScoringUnavailable(format!(
                "scoring agent returned {}: {}",
                status, body
            )));
        }

        response.json().await.map_err(|e| {
            WorkflowError::ScoringUnavailable(format!("failed to parse response: {}", e))
        })
    }
}
