//! Review command handlers
//!
//! Handles the approval gate commands: listing jobs waiting on a decision
//! and recording approve/reject decisions.

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use dubflow_client::OrchestratorClient;
use dubflow_core::domain::job::Job;

use crate::Config;
use crate::commands::job::{colorize_status, print_job_summary};
use crate::id_resolver::resolve_job_id;

/// Review subcommands
#[derive(Subcommand)]
pub enum ReviewCommands {
    /// List jobs waiting at the approval gate
    Pending,
    /// Approve a pending job
    Approve {
        /// Job ID or unambiguous prefix
        id: String,

        /// Reviewer identity recorded on the decision
        #[arg(long)]
        reviewer: String,

        /// Optional free-text reason
        #[arg(long)]
        reason: Option<String>,
    },
    /// Reject a pending job
    Reject {
        /// Job ID or unambiguous prefix
        id: String,

        /// Reviewer identity recorded on the decision
        #[arg(long)]
        reviewer: String,

        /// Optional free-text reason
        #[arg(long)]
        reason: Option<String>,
    },
}

/// Handle review commands
///
/// Routes review subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The review command to execute
/// * `config` - The CLI configuration
pub async fn handle_review_command(command: ReviewCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        ReviewCommands::Pending => list_pending(&client).await,
        ReviewCommands::Approve {
            id,
            reviewer,
            reason,
        } => decide(&client, &id, &reviewer, reason, true).await,
        ReviewCommands::Reject {
            id,
            reviewer,
            reason,
        } => decide(&client, &id, &reviewer, reason, false).await,
    }
}

/// List jobs waiting on a reviewer decision
async fn list_pending(client: &OrchestratorClient) -> Result<()> {
    let jobs = client.list_pending_approval().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs pending approval.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} job(s) pending approval:", jobs.len()).bold()
        );
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Record an approve or reject decision
async fn decide(
    client: &OrchestratorClient,
    id: &str,
    reviewer: &str,
    reason: Option<String>,
    approve: bool,
) -> Result<()> {
    let uuid = resolve_job_id(client, id).await?;

    let result = if approve {
        client.approve_job(uuid, reviewer, reason).await
    } else {
        client.reject_job(uuid, reviewer, reason).await
    };

    match result {
        Ok(job) => {
            if approve {
                println!("{}", "✓ Job approved".green().bold());
            } else {
                println!("{}", "✗ Job rejected".red().bold());
            }
            print_decision(&job);
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            println!("{}", "⚠ Job already has a decision".yellow());
            let job = client.get_job(uuid).await?;
            print_decision(&job);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print the recorded decision on a job
fn print_decision(job: &Job) {
    println!("  ID:       {}", job.id.to_string().cyan());
    println!("  Status:   {}", colorize_status(&job.status));

    if let Some(approval) = &job.approval {
        if let Some(decision) = approval.decision {
            println!("  Decision: {}", decision.as_str());
        }
        if let Some(reviewer) = &approval.reviewed_by {
            println!("  Reviewer: {}", reviewer);
        }
        if let Some(decided) = approval.decided_at {
            println!("  Decided:  {}", decided.format("%Y-%m-%d %H:%M:%S"));
        }
    }
}
