//! Job-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use dubflow_core::domain::job::Job;
use dubflow_core::dto::job::{CreateJob, DecisionRequest, JobSummary};
use uuid::Uuid;

impl OrchestratorClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a new translation job
    ///
    /// # Arguments
    /// * `req` - The job creation request
    ///
    /// # Returns
    /// The created job
    pub async fn create_job(&self, req: CreateJob) -> Result<Job> {
        let url = format!("{}/job/create", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    ///
    /// # Returns
    /// The job details
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let url = format!("{}/job/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List all jobs
    ///
    /// # Returns
    /// A list of job summaries, newest first
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        let url = format!("{}/job/list", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List jobs waiting at the approval gate
    ///
    /// # Returns
    /// A list of job summaries pending a reviewer decision
    pub async fn list_pending_approval(&self) -> Result<Vec<JobSummary>> {
        let url = format!("{}/job/list/pending-approval", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Reviewer Decisions
    // =============================================================================

    /// Approve a job waiting at the gate
    ///
    /// # Arguments
    /// * `job_id` - The job to approve
    /// * `reviewed_by` - Reviewer identity recorded on the decision
    /// * `reason` - Optional free-text reason
    ///
    /// # Returns
    /// The updated job snapshot
    pub async fn approve_job(
        &self,
        job_id: Uuid,
        reviewed_by: &str,
        reason: Option<String>,
    ) -> Result<Job> {
        let url = format!("{}/job/{}/approve", self.base_url, job_id);
        let response = self
            .client
            .post(&url)
            .json(&DecisionRequest {
                reviewed_by: reviewed_by.to_string(),
                reason,
            })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Reject a job waiting at the gate
    ///
    /// # Arguments
    /// * `job_id` - The job to reject
    /// * `reviewed_by` - Reviewer identity recorded on the decision
    /// * `reason` - Optional free-text reason
    ///
    /// # Returns
    /// The updated job snapshot
    pub async fn reject_job(
        &self,
        job_id: Uuid,
        reviewed_by: &str,
        reason: Option<String>,
    ) -> Result<Job> {
        let url = format!("{}/job/{}/reject", self.base_url, job_id);
        let response = self
            .client
            .post(&url)
            .json(&DecisionRequest {
                reviewed_by: reviewed_by.to_string(),
                reason,
            })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Request a new iteration of a completed job
    ///
    /// # Arguments
    /// * `job_id` - The completed job to re-iterate
    ///
    /// # Returns
    /// The updated job snapshot, back in the Iterating state
    pub async fn reiterate_job(&self, job_id: Uuid) -> Result<Job> {
        let url = format!("{}/job/{}/reiterate", self.base_url, job_id);
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }
}
