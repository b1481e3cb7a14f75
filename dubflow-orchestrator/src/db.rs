use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create jobs table. The row doubles as the workflow checkpoint: status
    // plus the stage-specific identifiers are written in a single UPDATE
    // before and after every externally-visible side effect.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id UUID PRIMARY KEY,
            source_locale VARCHAR(16) NOT NULL,
            target_locale VARCHAR(16) NOT NULL,
            voice_kind VARCHAR(32) NOT NULL,
            speaker_count INTEGER NOT NULL,
            subtitle_max_chars INTEGER,
            source_url TEXT NOT NULL,
            status VARCHAR(32) NOT NULL,
            translation_id VARCHAR(64),
            iteration_id VARCHAR(64),
            iteration_number INTEGER NOT NULL DEFAULT 0,
            pending_operation_id VARCHAR(64),
            resolved_source_url TEXT,
            output_media_url TEXT,
            output_source_subtitle_url TEXT,
            output_target_subtitle_url TEXT,
            output_metadata_url TEXT,
            validation JSONB,
            approval_requested_at TIMESTAMPTZ,
            approval_decision VARCHAR(16),
            approval_reviewed_by VARCHAR(255),
            approval_reason TEXT,
            approval_decided_at TIMESTAMPTZ,
            approval_automatic BOOLEAN NOT NULL DEFAULT FALSE,
            error TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at DESC)")
        .execute(pool)
        .await?;

    // Sweep query: pending gates ordered by when they opened.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_jobs_approval_requested_at
         ON jobs(approval_requested_at) WHERE approval_decision IS NULL",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
