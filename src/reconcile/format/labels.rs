//! Review result to label-set and commit-status mapping.

use crate::task::domain::{CodeReviewResult, RiskLevel};
use crate::vcs::domain::CommitState;

/// Label marking a merge request as reviewed.
const REVIEWED_LABEL: &str = "ai::reviewed";

/// Label added when any finding is security-categorized.
const SECURITY_LABEL: &str = "ai::security";

/// The three mutually exclusive risk labels.
const RISK_LABELS: [&str; 3] = ["ai::risk-high", "ai::risk-medium", "ai::risk-low"];

/// Maps review results onto GitLab labels and commit statuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelMapper;

impl LabelMapper {
    /// Creates a mapper.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the labels a review result earns.
    ///
    /// Always contains `ai::reviewed` and exactly one risk label matching
    /// the result's risk level (low when absent); `ai::security` is added
    /// whenever any finding is security-categorized, independent of
    /// severity.
    #[must_use]
    pub fn map_labels(&self, result: &CodeReviewResult) -> Vec<String> {
        let mut labels = vec![
            REVIEWED_LABEL.to_owned(),
            risk_label(result.summary.risk_level).to_owned(),
        ];
        if result.has_security_finding() {
            labels.push(SECURITY_LABEL.to_owned());
        }
        labels
    }

    /// Returns the commit status: failed iff at least one critical
    /// finding exists, independent of finding count.
    #[must_use]
    pub fn map_commit_status(&self, result: &CodeReviewResult) -> CommitState {
        if result.has_critical_finding() {
            CommitState::Failed
        } else {
            CommitState::Success
        }
    }

    /// Returns the risk labels that must be removed so the new label set
    /// never coexists with a stale tier from an earlier review.
    #[must_use]
    pub fn stale_risk_labels(&self, new_labels: &[String]) -> Vec<String> {
        RISK_LABELS
            .iter()
            .filter(|label| !new_labels.iter().any(|new| new == *label))
            .map(|label| (*label).to_owned())
            .collect()
    }
}

const fn risk_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "ai::risk-high",
        RiskLevel::Medium => "ai::risk-medium",
        RiskLevel::Low => "ai::risk-low",
    }
}
