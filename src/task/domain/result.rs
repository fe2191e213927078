//! Structured result payloads submitted by the external executor.
//!
//! Each task type has a concrete result shape; the tagged [`TaskResult`]
//! union is parsed from the raw submission at the intake boundary and
//! serialized only when crossing storage.

use super::{ResultParseError, TaskType};
use serde::{Deserialize, Serialize};

/// Severity of a single review finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before merge; fails the commit status.
    Critical,
    /// Should be fixed; posted as an inline thread.
    Major,
    /// Worth noting; appears only in the summary table.
    Minor,
}

impl Severity {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }

    /// Returns whether findings of this severity get an inline thread.
    #[must_use]
    pub const fn warrants_inline_thread(self) -> bool {
        matches!(self, Self::Critical | Self::Major)
    }
}

/// Overall risk assessment of a reviewed change set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// High risk change set.
    High,
    /// Medium risk change set.
    Medium,
    /// Low risk change set; also the default when the executor reports
    /// no findings.
    #[default]
    Low,
}

impl RiskLevel {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A single code review finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Finding number within the result, starting at 1.
    pub id: u32,
    /// Severity classification.
    pub severity: Severity,
    /// Free-form category (`security`, `bug`, `style`, …).
    pub category: String,
    /// File path the finding points at.
    pub file: String,
    /// First affected line.
    pub line: u32,
    /// Last affected line, when the finding spans a range.
    #[serde(default)]
    pub end_line: Option<u32>,
    /// Short finding title.
    pub title: String,
    /// Full description of the problem.
    pub description: String,
    /// Suggested fix, typically a diff block.
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// One row of the per-file walkthrough table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkthroughEntry {
    /// Changed file path.
    pub file: String,
    /// One-line summary of the change.
    pub change_summary: String,
}

/// Roll-up section of a code review result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Overall risk level; defaults to low when the executor omits it.
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Total number of findings.
    #[serde(default)]
    pub total_findings: u32,
    /// Per-file walkthrough rows.
    #[serde(default)]
    pub walkthrough: Vec<WalkthroughEntry>,
}

/// Structured result of a code review task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReviewResult {
    /// Roll-up summary section.
    pub summary: ReviewSummary,
    /// Individual findings.
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl CodeReviewResult {
    /// Returns whether any finding is critical.
    #[must_use]
    pub fn has_critical_finding(&self) -> bool {
        self.findings
            .iter()
            .any(|finding| finding.severity == Severity::Critical)
    }

    /// Returns whether any finding is categorized as security.
    #[must_use]
    pub fn has_security_finding(&self) -> bool {
        self.findings
            .iter()
            .any(|finding| finding.category.eq_ignore_ascii_case("security"))
    }
}

/// One file touched by a feature development task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFileSummary {
    /// File path.
    pub path: String,
    /// `created` or `modified`.
    pub action: String,
    /// One-line summary of the change.
    #[serde(default)]
    pub summary: String,
}

/// Structured result of a feature development task.
///
/// The executor pushes a branch; creating the merge request is left to the
/// server because the sandboxed runner only holds the CI trigger token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDevResult {
    /// Branch the executor pushed the work to.
    pub branch: String,
    /// Title for the merge request.
    pub mr_title: String,
    /// Description for the merge request.
    #[serde(default)]
    pub mr_description: Option<String>,
    /// Whether the executor added tests.
    #[serde(default)]
    pub tests_added: bool,
    /// Files touched by the change.
    #[serde(default)]
    pub files_changed: Vec<ChangedFileSummary>,
    /// Free-form notes for the issue summary.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Structured result of an ask/issue-discussion task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// The question being answered, echoed by the executor.
    #[serde(default)]
    pub question: Option<String>,
    /// The markdown answer.
    pub answer: String,
}

/// Result union keyed by task type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum TaskResult {
    /// Code review findings and summary.
    CodeReview(CodeReviewResult),
    /// Feature development branch and merge request metadata.
    FeatureDev(FeatureDevResult),
    /// Free-text answer to a question or issue discussion.
    Answer(AnswerResult),
    /// Schema-less document payload (PRD creation).
    Document(serde_json::Value),
}

impl TaskResult {
    /// Parses a raw executor submission against the schema for the task
    /// type.
    ///
    /// # Errors
    ///
    /// Returns [`ResultParseError`] when the payload does not deserialize
    /// into the expected shape.
    pub fn from_submission(
        task_type: TaskType,
        value: serde_json::Value,
    ) -> Result<Self, ResultParseError> {
        let parse_error = |err: serde_json::Error| ResultParseError {
            task_type,
            reason: err.to_string(),
        };
        match task_type {
            TaskType::CodeReview => Ok(Self::CodeReview(
                serde_json::from_value(value).map_err(parse_error)?,
            )),
            TaskType::FeatureDev | TaskType::UiAdjustment => Ok(Self::FeatureDev(
                serde_json::from_value(value).map_err(parse_error)?,
            )),
            TaskType::IssueDiscussion => Ok(Self::Answer(
                serde_json::from_value(value).map_err(parse_error)?,
            )),
            TaskType::PrdCreation => Ok(Self::Document(value)),
        }
    }

    /// Returns the code review payload, when this is a review result.
    #[must_use]
    pub const fn as_code_review(&self) -> Option<&CodeReviewResult> {
        match self {
            Self::CodeReview(result) => Some(result),
            _ => None,
        }
    }

    /// Returns the feature-dev payload, when present.
    #[must_use]
    pub const fn as_feature_dev(&self) -> Option<&FeatureDevResult> {
        match self {
            Self::FeatureDev(result) => Some(result),
            _ => None,
        }
    }

    /// Returns the answer payload, when present.
    #[must_use]
    pub const fn as_answer(&self) -> Option<&AnswerResult> {
        match self {
            Self::Answer(result) => Some(result),
            _ => None,
        }
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Token counts reported by the executor. Absent or null counts read as
/// zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub input: u64,
    /// Output tokens produced.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub output: u64,
    /// Thinking tokens produced.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub thinking: u64,
}

impl TokenUsage {
    /// Returns the total token count across all three categories.
    #[must_use]
    pub const fn total(self) -> u64 {
        self.input + self.output + self.thinking
    }
}

/// Provenance of the prompt and schema versions the executor ran with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVersion {
    /// Skill prompt version.
    pub skill: String,
    /// Project instructions version.
    pub claude_md: String,
    /// Result schema version.
    pub schema: String,
}
