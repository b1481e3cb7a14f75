//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod job;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the main API router with all endpoints
pub fn create_router(pool: PgPool) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/job/create", post(job::create_job))
        .route("/job/list", get(job::list_all_jobs))
        .route("/job/list/pending-approval", get(job::list_pending_approval))
        .route("/job/{id}", get(job::get_job))
        .route("/job/{id}/approve", post(job::approve_job))
        .route("/job/{id}/reject", post(job::reject_job))
        .route("/job/{id}/reiterate", post(job::reiterate_job))
        // Add state and middleware
        .with_state(pool)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
