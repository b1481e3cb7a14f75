//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod review;

pub use job::JobCommands;
pub use review::ReviewCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Approval gate review
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Review { command } => review::handle_review_command(command, config).await,
    }
}
