//! Approval gate domain types
//!
//! A job pauses at the approval gate until exactly one reviewer decision
//! arrives, or until the deadline passes and the configured default decision
//! is applied automatically. Only the first decision is honored.

use serde::{Deserialize, Serialize};

/// Reviewer decision on a pending job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl ApprovalDecision {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Approved" => Some(ApprovalDecision::Approved),
            "Rejected" => Some(ApprovalDecision::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalDecision::Approved => "Approved",
            ApprovalDecision::Rejected => "Rejected",
        }
    }
}

/// State of the approval gate for a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalState {
    /// When the gate opened; the deadline is computed from this timestamp.
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub decision: Option<ApprovalDecision>,
    pub reviewed_by: Option<String>,
    pub reason: Option<String>,
    pub decided_at: Option<chrono::DateTime<chrono::Utc>>,
    /// True when the decision was applied by the deadline sweep rather than
    /// a reviewer.
    pub automatic: bool,
}

impl ApprovalState {
    /// Opens a fresh gate with no decision.
    pub fn open(now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            requested_at: now,
            decision: None,
            reviewed_by: None,
            reason: None,
            decided_at: None,
            automatic: false,
        }
    }

    /// Whether the gate deadline has passed without a decision.
    pub fn is_expired(&self, timeout: chrono::Duration, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.decision.is_none() && now >= self.requested_at + timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_gate_not_expired_before_deadline() {
        let opened = chrono::Utc::now();
        let gate = ApprovalState::open(opened);
        assert!(!gate.is_expired(Duration::days(3), opened + Duration::days(2)));
    }

    #[test]
    fn test_gate_expired_after_deadline() {
        let opened = chrono::Utc::now();
        let gate = ApprovalState::open(opened);
        assert!(gate.is_expired(Duration::days(3), opened + Duration::days(3)));
    }

    #[test]
    fn test_decided_gate_never_expires() {
        let opened = chrono::Utc::now();
        let mut gate = ApprovalState::open(opened);
        gate.decision = Some(ApprovalDecision::Approved);
        gate.reviewed_by = Some("reviewer@example.com".to_string());
        assert!(!gate.is_expired(Duration::days(3), opened + Duration::days(30)));
    }

    #[test]
    fn test_decision_parse_roundtrip() {
        assert_eq!(ApprovalDecision::parse("Approved"), Some(ApprovalDecision::Approved));
        assert_eq!(ApprovalDecision::parse("Rejected"), Some(ApprovalDecision::Rejected));
        assert_eq!(ApprovalDecision::parse("Maybe"), None);
        assert_eq!(ApprovalDecision::Approved.as_str(), "Approved");
    }
}
