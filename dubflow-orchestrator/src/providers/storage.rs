//! HTTP storage gateway client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::providers::StorageClient;
use crate::workflow::error::WorkflowError;

pub struct HttpStorageClient {
    base_url: String,
    /// Public host of our storage account; URLs on this host carrying a
    /// signature are recognized as already-resolved references.
    public_host: String,
    client: Client,
}

#[derive(Deserialize)]
struct BlobUrlResponse {
    url: String,
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

impl HttpStorageClient {
    pub fn new(base_url: impl Into<String>, public_host: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            public_host: public_host.into(),
            client: Client::new(),
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, WorkflowError> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WorkflowError::Storage(format!(
                "storage gateway returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WorkflowError::Storage(format!("failed to parse response: {}", e)))
    }
}

#[async_trait]
impl StorageClient for HttpStorageClient {
    async fn copy_from_url(
        &self,
        source_url: &str,
        container: &str,
        path: &str,
    ) -> Result<String, WorkflowError> {
        let url = format!(
            "{}/containers/{}/blobs/{}/copy",
            self.base_url, container, path
        );
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "source_url": source_url }))
            .send()
            .await
            .map_err(|e| WorkflowError::Storage(format!("copy request failed: {}", e)))?;

        let body: BlobUrlResponse = self.handle_response(response).await?;
        Ok(body.url)
    }

    async fn generate_signed_url(
        &self,
        container: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, WorkflowError> {
        let url = format!(
            "{}/containers/{}/blobs/{}/sign",
            self.base_url, container, path
        );
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "ttl_seconds": ttl.as_secs() }))
            .send()
            .await
            .map_err(|e| WorkflowError::Storage(format!("sign request failed: {}", e)))?;

        let body: BlobUrlResponse = self.handle_response(response).await?;
        Ok(body.url)
    }

    async fn exists(&self, container: &str, path: &str) -> Result<bool, WorkflowError> {
        let url = format!("{}/containers/{}/blobs/{}", self.base_url, container, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorkflowError::Storage(format!("exists request failed: {}", e)))?;

        if response.status().as_u16() == 404 {
            return Ok(false);
        }

        let body: ExistsResponse = self.handle_response(response).await?;
        Ok(body.exists)
    }

    fn owns_url(&self, url: &str) -> bool {
        url.contains(&self.public_host) && url.contains("sig=")
    }
}
