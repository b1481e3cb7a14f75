//! Quality validation domain types and score aggregation
//!
//! Specialist reviewers each score one aspect of the translated output.
//! Aggregation is a pure function of the collected reviews: deterministic,
//! side-effect free, and safe to recompute at any time.

use serde::{Deserialize, Serialize};

/// Overall score at or above which an unflagged job is recommended for approval.
pub const APPROVE_THRESHOLD: f64 = 85.0;

/// Overall score below which a job is recommended for rejection.
pub const REJECT_THRESHOLD: f64 = 60.0;

/// Specialist review category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewCategory {
    TranslationAccuracy,
    Technical,
    Cultural,
}

impl ReviewCategory {
    /// All categories, in scoring order.
    pub fn all() -> [ReviewCategory; 3] {
        [
            ReviewCategory::TranslationAccuracy,
            ReviewCategory::Technical,
            ReviewCategory::Cultural,
        ]
    }

    /// Default aggregation weight; renormalized over participating reviewers.
    pub fn weight(&self) -> f64 {
        match self {
            ReviewCategory::TranslationAccuracy => 0.4,
            ReviewCategory::Technical => 0.3,
            ReviewCategory::Cultural => 0.3,
        }
    }
}

/// Severity of an issue found by a reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Single issue reported by a specialist reviewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub severity: IssueSeverity,
    pub description: String,
}

/// Result of one specialist review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistReview {
    pub category: ReviewCategory,
    /// Score on a 0-100 scale.
    pub score: f64,
    pub issues: Vec<ReviewIssue>,
    pub reasoning: String,
}

impl SpecialistReview {
    pub fn has_critical_issue(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Critical)
    }
}

/// Aggregated recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Approve,
    Reject,
    NeedsReview,
}

/// Combined outcome of the validation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Weighted average over participating reviewers; `None` when no
    /// reviewer produced a score.
    pub overall_score: Option<f64>,
    pub recommendation: Recommendation,
    pub reviews: Vec<SpecialistReview>,
}

impl ValidationOutcome {
    pub fn is_scored(&self) -> bool {
        self.overall_score.is_some()
    }
}

/// Combines specialist reviews into a single recommendation.
///
/// Overall score is the weighted average of participating reviewer scores;
/// missing reviewers are excluded and the weights renormalize over the
/// remainder. Any critical-severity issue forces a rejection regardless of
/// score.
pub fn aggregate(reviews: Vec<SpecialistReview>) -> ValidationOutcome {
    if reviews.is_empty() {
        return ValidationOutcome {
            overall_score: None,
            recommendation: Recommendation::NeedsReview,
            reviews,
        };
    }

    let total_weight: f64 = reviews.iter().map(|r| r.category.weight()).sum();
    let weighted_sum: f64 = reviews
        .iter()
        .map(|r| r.score * r.category.weight())
        .sum();
    let overall = weighted_sum / total_weight;

    let any_critical = reviews.iter().any(|r| r.has_critical_issue());

    let recommendation = if any_critical || overall < REJECT_THRESHOLD {
        Recommendation::Reject
    } else if overall >= APPROVE_THRESHOLD {
        Recommendation::Approve
    } else {
        Recommendation::NeedsReview
    };

    ValidationOutcome {
        overall_score: Some(overall),
        recommendation,
        reviews,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(category: ReviewCategory, score: f64) -> SpecialistReview {
        SpecialistReview {
            category,
            score,
            issues: Vec::new(),
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_weighted_average_full_panel() {
        let outcome = aggregate(vec![
            review(ReviewCategory::TranslationAccuracy, 90.0),
            review(ReviewCategory::Technical, 80.0),
            review(ReviewCategory::Cultural, 70.0),
        ]);

        // 90*0.4 + 80*0.3 + 70*0.3 = 81
        let overall = outcome.overall_score.unwrap();
        assert!((overall - 81.0).abs() < 1e-9);
        assert_eq!(outcome.recommendation, Recommendation::NeedsReview);
    }

    #[test]
    fn test_weights_renormalize_when_reviewer_missing() {
        let outcome = aggregate(vec![
            review(ReviewCategory::TranslationAccuracy, 90.0),
            review(ReviewCategory::Technical, 80.0),
        ]);

        // (90*0.4 + 80*0.3) / 0.7 ~= 85.714
        let overall = outcome.overall_score.unwrap();
        assert!((overall - 85.714).abs() < 1e-2);
        assert_eq!(outcome.recommendation, Recommendation::Approve);
    }

    #[test]
    fn test_critical_issue_forces_rejection() {
        let mut accuracy = review(ReviewCategory::TranslationAccuracy, 95.0);
        accuracy.issues.push(ReviewIssue {
            severity: IssueSeverity::Critical,
            description: "Mistranslated safety warning".to_string(),
        });

        let outcome = aggregate(vec![
            accuracy,
            review(ReviewCategory::Technical, 95.0),
            review(ReviewCategory::Cultural, 95.0),
        ]);

        assert_eq!(outcome.recommendation, Recommendation::Reject);
    }

    #[test]
    fn test_low_score_rejected() {
        let outcome = aggregate(vec![
            review(ReviewCategory::TranslationAccuracy, 50.0),
            review(ReviewCategory::Technical, 60.0),
            review(ReviewCategory::Cultural, 55.0),
        ]);

        assert!(outcome.overall_score.unwrap() < REJECT_THRESHOLD);
        assert_eq!(outcome.recommendation, Recommendation::Reject);
    }

    #[test]
    fn test_high_scores_approved() {
        let outcome = aggregate(vec![
            review(ReviewCategory::TranslationAccuracy, 92.0),
            review(ReviewCategory::Technical, 88.0),
            review(ReviewCategory::Cultural, 90.0),
        ]);

        assert_eq!(outcome.recommendation, Recommendation::Approve);
    }

    #[test]
    fn test_no_reviews_is_unscored() {
        let outcome = aggregate(Vec::new());
        assert!(!outcome.is_scored());
        assert_eq!(outcome.recommendation, Recommendation::NeedsReview);
    }

    #[test]
    fn test_non_critical_issues_do_not_force_rejection() {
        let mut technical = review(ReviewCategory::Technical, 90.0);
        technical.issues.push(ReviewIssue {
            severity: IssueSeverity::High,
            description: "Subtitle timing drifts in the last segment".to_string(),
        });

        let outcome = aggregate(vec![
            review(ReviewCategory::TranslationAccuracy, 90.0),
            technical,
            review(ReviewCategory::Cultural, 88.0),
        ]);

        assert_eq!(outcome.recommendation, Recommendation::Approve);
    }
}
