//! Job command handlers
//!
//! Handles all job-related CLI commands including submission, listing,
//! viewing details, and re-iteration requests.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use dubflow_core::domain::job::{Job, JobStatus};
use dubflow_core::dto::job::{CreateJob, JobSummary};

use dubflow_client::OrchestratorClient;

use crate::Config;
use crate::id_resolver::resolve_job_id;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Submit a new translation job
    Submit {
        /// Source media URL or internal container/path reference
        source_url: String,

        /// Source locale (e.g. en-US)
        #[arg(long)]
        from: String,

        /// Target locale (e.g. es-ES)
        #[arg(long)]
        to: String,

        /// Voice kind: PlatformVoice or PersonalVoice
        #[arg(long, default_value = "PlatformVoice")]
        voice: String,

        /// Number of speakers in the source media
        #[arg(long, default_value_t = 1)]
        speakers: i32,

        /// Maximum characters per subtitle segment
        #[arg(long)]
        subtitle_max_chars: Option<i32>,
    },
    /// List all jobs
    List,
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Request a new iteration of a completed job
    Reiterate {
        /// Job ID or unambiguous prefix
        id: String,
    },
}

/// Handle job commands
///
/// Routes job subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The job command to execute
/// * `config` - The CLI configuration
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    match command {
        JobCommands::Submit {
            source_url,
            from,
            to,
            voice,
            speakers,
            subtitle_max_chars,
        } => {
            submit_job(
                &client,
                CreateJob {
                    source_locale: from,
                    target_locale: to,
                    voice_kind: voice,
                    speaker_count: speakers,
                    subtitle_max_chars,
                    source_url,
                },
            )
            .await
        }
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Reiterate { id } => reiterate_job(&client, &id).await,
    }
}

/// Submit a new job
async fn submit_job(client: &OrchestratorClient, req: CreateJob) -> Result<()> {
    let job = client.create_job(req).await?;

    println!("{}", "✓ Job submitted".green().bold());
    println!("  ID:     {}", job.id.to_string().cyan());
    println!(
        "  Route:  {} → {}",
        job.request.source_locale, job.request.target_locale
    );
    println!("  Status: {}", colorize_status(&job.status));

    Ok(())
}

/// List all jobs
async fn list_jobs(client: &OrchestratorClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Get and display a single job
async fn get_job(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, id).await?;

    let job = client.get_job(uuid).await?;

    print_job_details(&job);

    Ok(())
}

/// Request a new iteration of a completed job
async fn reiterate_job(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, id).await?;

    let job = client.reiterate_job(uuid).await?;

    println!("{}", "✓ Re-iteration requested".green().bold());
    println!("  ID:        {}", job.id.to_string().cyan());
    println!("  Status:    {}", colorize_status(&job.status));
    println!("  Iteration: {}", job.iteration_number + 1);

    Ok(())
}

/// Print a compact job summary
pub fn print_job_summary(job: &JobSummary) {
    let status_colored = colorize_status(&job.status);

    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    println!(
        "    Route:     {} → {}",
        job.source_locale, job.target_locale
    );
    println!("    Status:    {}", status_colored);
    println!("    Iteration: {}", job.iteration_number);
    println!(
        "    Created:   {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
pub fn print_job_details(job: &Job) {
    let status_colored = colorize_status(&job.status);

    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  Status:      {}", status_colored);
    println!(
        "  Route:       {} → {}",
        job.request.source_locale, job.request.target_locale
    );
    println!("  Voice:       {}", job.request.voice_kind.as_str());
    println!("  Speakers:    {}", job.request.speaker_count);
    println!("  Source:      {}", job.request.source_url.dimmed());
    println!("  Iteration:   {}", job.iteration_number);
    println!(
        "  Created:     {}",
        job.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:     {}",
        job.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(translation_id) = &job.translation_id {
        println!("  Translation: {}", translation_id.dimmed());
    }

    if let Some(outputs) = &job.outputs {
        println!("\n{}", "Outputs:".bold());
        println!("  Media:            {}", outputs.translated_media_url);
        println!("  Source subtitles: {}", outputs.source_subtitle_url);
        println!("  Target subtitles: {}", outputs.target_subtitle_url);
        println!("  Metadata:         {}", outputs.metadata_url);
    }

    if let Some(validation) = &job.validation {
        println!("\n{}", "Validation:".bold());
        match validation.overall_score {
            Some(score) => println!("  Overall score:  {:.1}", score),
            None => println!("  Overall score:  {}", "unscored".yellow()),
        }
        println!(
            "  Recommendation: {:?}",
            validation.recommendation
        );
        for review in &validation.reviews {
            println!(
                "  {} {:?}: {:.1} ({} issue(s))",
                "▸".cyan(),
                review.category,
                review.score,
                review.issues.len()
            );
        }
    }

    if let Some(approval) = &job.approval {
        println!("\n{}", "Approval:".bold());
        println!(
            "  Requested: {}",
            approval.requested_at.format("%Y-%m-%d %H:%M:%S")
        );
        match approval.decision {
            Some(decision) => {
                println!(
                    "  Decision:  {} {}",
                    decision.as_str(),
                    if approval.automatic {
                        "(automatic)".dimmed()
                    } else {
                        "".dimmed()
                    }
                );
                if let Some(reviewer) = &approval.reviewed_by {
                    println!("  Reviewer:  {}", reviewer);
                }
                if let Some(reason) = &approval.reason {
                    println!("  Reason:    {}", reason);
                }
            }
            None => println!("  Decision:  {}", "pending".yellow()),
        }
    }

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}

/// Colorize job status for display
pub fn colorize_status(status: &JobStatus) -> colored::ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        JobStatus::Submitted | JobStatus::Validating => status_str.yellow(),
        JobStatus::Translating
        | JobStatus::AwaitingTranslation
        | JobStatus::Iterating
        | JobStatus::AwaitingIteration
        | JobStatus::RunningValidation => status_str.cyan(),
        JobStatus::PendingApproval => status_str.magenta(),
        JobStatus::Approved | JobStatus::Completed => status_str.green(),
        JobStatus::Rejected | JobStatus::Failed => status_str.red(),
    }
}
