//! Job ID resolution
//!
//! Jobs are addressed by UUID, but typing a full one is painful; the CLI
//! also accepts an unambiguous prefix and resolves it against the
//! orchestrator's job list.

use anyhow::{Context, Result, anyhow};
use uuid::Uuid;

use dubflow_client::OrchestratorClient;

/// How the user referred to a job on the command line
#[derive(Debug, Clone)]
enum JobSelector {
    /// Full job UUID; used directly, no lookup needed.
    Id(Uuid),
    /// Prefix that must match exactly one job id.
    Prefix(String),
}

impl JobSelector {
    fn parse(input: &str) -> Self {
        match Uuid::parse_str(input) {
            Ok(id) => JobSelector::Id(id),
            // Job ids render as lowercase hex, so prefix matching is
            // case-insensitive for the user.
            Err(_) => JobSelector::Prefix(input.to_lowercase()),
        }
    }
}

/// Resolve a job argument to a full UUID.
///
/// # Arguments
/// * `client` - The API client used to list jobs for prefix matching
/// * `input` - Full UUID or unambiguous prefix as typed by the user
///
/// # Errors
/// Returns an error if no job matches the prefix, the prefix is ambiguous,
/// or the job list cannot be fetched.
pub async fn resolve_job_id(client: &OrchestratorClient, input: &str) -> Result<Uuid> {
    let prefix = match JobSelector::parse(input) {
        JobSelector::Id(id) => return Ok(id),
        JobSelector::Prefix(prefix) => prefix,
    };

    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    let matches: Vec<_> = jobs
        .iter()
        .filter(|j| j.id.to_string().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => Err(anyhow!("No job found with ID starting with '{}'", prefix)),
        1 => Ok(matches[0].id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|j| j.id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
