//! Dubflow CLI
//!
//! Command-line interface for the Dubflow media translation orchestrator.

mod commands;
mod id_resolver;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};

#[derive(Parser)]
#[command(name = "dubflow")]
#[command(about = "Dubflow media translation CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL
    #[arg(
        long,
        env = "DUBFLOW_ORCHESTRATOR_URL",
        default_value = "http://localhost:8080"
    )]
    orchestrator_url: String,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every command handler
pub struct Config {
    /// URL of the orchestrator service
    pub orchestrator_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        orchestrator_url: cli.orchestrator_url,
    };

    handle_command(cli.command, &config).await
}
