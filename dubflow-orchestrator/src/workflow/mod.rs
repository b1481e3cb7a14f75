//! Workflow layer
//!
//! Drives jobs through the translation pipeline. The driver polls the job
//! store for runnable jobs and advances each in its own task; each stage
//! transition is checkpointed before the next stage begins, so a restarted
//! orchestrator resumes every job from its last completed stage.

pub mod approval;
pub mod engine;
pub mod error;
pub mod poll;
pub mod retry;
pub mod scoring;
pub mod validate;

pub use engine::WorkflowContext;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::repository::job_repository;
use crate::workflow::error::WorkflowError;

/// Workflow driver that continuously picks up and advances runnable jobs
pub struct WorkflowDriver {
    ctx: Arc<WorkflowContext>,
    semaphore: Arc<Semaphore>,
    /// Jobs currently being advanced by this instance; prevents claiming
    /// the same job twice while its task is in flight.
    active: Arc<Mutex<HashSet<Uuid>>>,
}

impl WorkflowDriver {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        let semaphore = Arc::new(Semaphore::new(ctx.config.max_parallel_workflows));
        Self {
            ctx,
            semaphore,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Starts the driver loop. On the first pass this naturally picks up
    /// any job a previous process left mid-stage.
    pub async fn run(&self) {
        info!(
            "Starting workflow driver (interval: {:?}, max parallel: {})",
            self.ctx.config.driver_interval, self.ctx.config.max_parallel_workflows
        );

        let mut interval = time::interval(self.ctx.config.driver_interval);

        loop {
            interval.tick().await;

            match self.claim_and_advance_once().await {
                Ok(claimed) => {
                    if claimed > 0 {
                        debug!("Claimed {} job(s) this cycle", claimed);
                    }
                }
                Err(e) => {
                    error!("Error during driver cycle: {}", e);
                }
            }
        }
    }

    /// Performs a single scan, spawning a task per claimable job.
    ///
    /// Workflows run for hours, so tasks are not awaited here; the active
    /// set keeps later scans from double-claiming them.
    async fn claim_and_advance_once(&self) -> Result<usize, WorkflowError> {
        let jobs = job_repository::find_runnable(&self.ctx.pool).await?;

        if jobs.is_empty() {
            return Ok(0);
        }

        let mut claimed = 0;

        for job in jobs {
            let job_id = job.id;

            {
                let mut active = self.active.lock().unwrap();
                if active.contains(&job_id) {
                    continue;
                }
                active.insert(job_id);
            }

            if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
                self.spawn_workflow_task(job_id, permit);
                claimed += 1;
            } else {
                self.active.lock().unwrap().remove(&job_id);
                debug!("Max parallel workflows reached, leaving job {} queued", job_id);
                break;
            }
        }

        Ok(claimed)
    }

    /// Spawns a task that advances a single job to its next rest state
    fn spawn_workflow_task(
        &self,
        job_id: Uuid,
        _permit: tokio::sync::OwnedSemaphorePermit,
    ) -> tokio::task::JoinHandle<()> {
        let ctx = Arc::clone(&self.ctx);
        let active = Arc::clone(&self.active);

        tokio::spawn(async move {
            if let Err(e) = engine::advance_to_rest(&ctx, job_id).await {
                error!("Failed to advance job {}: {}", job_id, e);
            }
            active.lock().unwrap().remove(&job_id);
            // Permit is automatically released when dropped
        })
    }
}
