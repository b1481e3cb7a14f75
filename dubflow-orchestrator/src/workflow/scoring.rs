//! Automated quality validation stage
//!
//! Invokes the scoring agent once per specialist category and aggregates
//! the collected reviews. A failed scoring call excludes that category from
//! aggregation; it never fails the workflow.

use dubflow_core::domain::job::{Job, JobOutputs};
use dubflow_core::domain::validation::{self, ReviewCategory, ValidationOutcome};
use tracing::{info, warn};

use crate::providers::{ScoringAgent, ScoringRequest};

/// Scores the job's outputs across all specialist categories.
pub async fn run_validation(
    scoring: &dyn ScoringAgent,
    job: &Job,
    outputs: &JobOutputs,
) -> ValidationOutcome {
    let mut reviews = Vec::new();

    for category in ReviewCategory::all() {
        let req = ScoringRequest {
            category,
            source_subtitle_url: outputs.source_subtitle_url.clone(),
            target_subtitle_url: outputs.target_subtitle_url.clone(),
            source_locale: job.request.source_locale.clone(),
            target_locale: job.request.target_locale.clone(),
        };

        match scoring.score(&req).await {
            Ok(review) => reviews.push(review),
            Err(e) => {
                warn!(
                    "Scoring {:?} unavailable for job {}, category left unscored: {}",
                    category, job.id, e
                );
            }
        }
    }

    let outcome = validation::aggregate(reviews);

    info!(
        "Job {} validation complete: score={:?} recommendation={:?}",
        job.id, outcome.overall_score, outcome.recommendation
    );

    outcome
}
