//! Job API Handlers
//!
//! HTTP endpoints for the job lifecycle boundary: submission, status
//! queries, and reviewer decisions. Every mutating call returns the updated
//! job snapshot; reads are non-blocking point-in-time views of the store.

use axum::{
    Json,
    extract::{Path, State},
};
use dubflow_core::domain::approval::ApprovalDecision;
use dubflow_core::domain::job::Job;
use dubflow_core::dto::job::{CreateJob, DecisionRequest, JobSummary};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::job_service;

/// POST /job/create
/// Submit a new translation job
pub async fn create_job(
    State(pool): State<PgPool>,
    Json(req): Json<CreateJob>,
) -> ApiResult<Json<Job>> {
    tracing::info!(
        "Submitting job: {} -> {}",
        req.source_locale,
        req.target_locale
    );

    let job = job_service::submit_job(&pool, req).await?;

    Ok(Json(job))
}

/// GET /job/{id}
/// Get job details by ID
pub async fn get_job(State(pool): State<PgPool>, Path(id): Path<Uuid>) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);

    let job = job_service::get_job(&pool, id).await?;

    Ok(Json(job))
}

/// GET /job/list
/// List all jobs
pub async fn list_all_jobs(State(pool): State<PgPool>) -> ApiResult<Json<Vec<JobSummary>>> {
    tracing::debug!("Listing all jobs");

    let jobs = job_service::list_all_jobs(&pool).await?;
    let summaries: Vec<JobSummary> = jobs.iter().map(JobSummary::from).collect();

    Ok(Json(summaries))
}

/// GET /job/list/pending-approval
/// List jobs waiting at the approval gate
pub async fn list_pending_approval(
    State(pool): State<PgPool>,
) -> ApiResult<Json<Vec<JobSummary>>> {
    tracing::debug!("Listing jobs pending approval");

    let jobs = job_service::list_pending_approval(&pool).await?;
    let summaries: Vec<JobSummary> = jobs.iter().map(JobSummary::from).collect();

    Ok(Json(summaries))
}

/// POST /job/{id}/approve
/// Approve a job waiting at the gate
pub async fn approve_job(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Reviewer {} approving job {}", req.reviewed_by, id);

    let job = job_service::decide_job(
        &pool,
        id,
        ApprovalDecision::Approved,
        &req.reviewed_by,
        req.reason.as_deref(),
    )
    .await?;

    Ok(Json(job))
}

/// POST /job/{id}/reject
/// Reject a job waiting at the gate
pub async fn reject_job(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Reviewer {} rejecting job {}", req.reviewed_by, id);

    let job = job_service::decide_job(
        &pool,
        id,
        ApprovalDecision::Rejected,
        &req.reviewed_by,
        req.reason.as_deref(),
    )
    .await?;

    Ok(Json(job))
}

/// POST /job/{id}/reiterate
/// Request a new iteration of a completed job
pub async fn reiterate_job(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::info!("Re-iteration requested for job {}", id);

    let job = job_service::request_reiteration(&pool, id).await?;

    Ok(Json(job))
}
