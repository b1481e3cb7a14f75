//! Approval deadline sweeper
//!
//! Periodic task that applies the configured default decision to any job
//! whose approval gate has been open past the deadline with no reviewer
//! action. The conditional decision write in the repository guarantees the
//! default applies at most once, even with a reviewer racing the sweep.

use sqlx::PgPool;
use tokio::time;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::repository::job_repository;

pub struct ApprovalSweeper {
    pool: PgPool,
    config: Config,
}

impl ApprovalSweeper {
    pub fn new(pool: PgPool, config: Config) -> Self {
        Self { pool, config }
    }

    /// Runs the sweep loop forever.
    pub async fn run(&self) {
        info!(
            "Starting approval sweeper (interval: {:?}, deadline: {}h, default: {:?})",
            self.config.sweep_interval,
            self.config.approval_timeout.num_hours(),
            self.config.approval_default,
        );

        let mut interval = time::interval(self.config.sweep_interval);

        loop {
            interval.tick().await;

            match self.sweep_once().await {
                Ok(applied) => {
                    if applied > 0 {
                        info!("Applied default decision to {} expired gate(s)", applied);
                    }
                }
                Err(e) => {
                    error!("Approval sweep failed: {}", e);
                }
            }
        }
    }

    /// Applies the default decision to every expired gate. Returns how many
    /// jobs were decided this pass.
    pub async fn sweep_once(&self) -> Result<usize, sqlx::Error> {
        let cutoff = chrono::Utc::now() - self.config.approval_timeout;
        let expired = job_repository::find_expired_gates(&self.pool, cutoff).await?;

        let mut applied = 0;
        for job in expired {
            let decided = job_repository::record_decision(
                &self.pool,
                job.id,
                self.config.approval_default,
                None,
                Some("approval deadline elapsed"),
                true,
            )
            .await?;

            if decided {
                info!(
                    "Job {} gate expired, default decision {:?} applied",
                    job.id, self.config.approval_default
                );
                applied += 1;
            } else {
                // A reviewer decided between the query and the write.
                debug!("Job {} was decided before the sweep reached it", job.id);
            }
        }

        Ok(applied)
    }
}
