//! Dubflow Orchestrator
//!
//! Drives media translation jobs through a long-running pipeline: input
//! validation, provider submission, status polling, iteration creation,
//! automated quality scoring, and a timeout-bound human approval gate.
//!
//! Architecture:
//! - API: axum HTTP boundary (submit, query, approve/reject, re-iterate)
//! - Service: boundary business logic
//! - Repository: the durable job store; every row is a workflow checkpoint
//! - Workflow: the state machine driver, polling scheduler, and approval
//!   deadline sweeper
//! - Providers: translation, storage, and scoring collaborators behind
//!   traits

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod providers;
pub mod repository;
pub mod service;
pub mod workflow;

use crate::config::Config;
use crate::providers::{HttpScoringAgent, HttpStorageClient, HttpTranslationProvider};
use crate::workflow::approval::ApprovalSweeper;
use crate::workflow::{WorkflowContext, WorkflowDriver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dubflow_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Dubflow Orchestrator...");

    // Load and validate configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool).await?;

    // Wire up external collaborators
    let provider = Arc::new(HttpTranslationProvider::new(config.provider_url.clone()));
    let storage = Arc::new(HttpStorageClient::new(
        config.storage_url.clone(),
        config.storage_public_host.clone(),
    ));
    let scoring = Arc::new(HttpScoringAgent::new(config.scoring_url.clone()));

    let ctx = Arc::new(WorkflowContext {
        pool: pool.clone(),
        provider,
        storage,
        scoring,
        config: config.clone(),
    });

    // Start the workflow driver; its first scan resumes any job a previous
    // process left mid-stage.
    let driver = WorkflowDriver::new(Arc::clone(&ctx));
    tokio::spawn(async move { driver.run().await });

    // Start the approval deadline sweeper
    let sweeper = ApprovalSweeper::new(pool.clone(), config.clone());
    tokio::spawn(async move { sweeper.run().await });

    // Build router with all API endpoints
    let app = api::create_router(pool);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
