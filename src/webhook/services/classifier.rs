//! Intent classification for parsed webhook events.
//!
//! A pure function over the typed event union, checked in precedence
//! order. Bot-authored notes are discarded before command parsing so the
//! bot can never react to its own posts.

use regex::Regex;
use std::sync::LazyLock;

use crate::task::domain::Intent;
use crate::vcs::domain::ActorId;
use crate::webhook::domain::{MergeRequestAction, RoutedEvent, WebhookEvent};

/// Label that turns an issue into a feature development request.
const DEVELOP_LABEL: &str = "ai::develop";

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@ai\b").expect("valid mention pattern"));

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
static ASK_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"@ai\s+ask\s+"([^"]+)""#).expect("valid ask pattern"));

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
static REVIEW_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@ai\s+review\b").expect("valid review pattern"));

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
static IMPROVE_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@ai\s+improve\b").expect("valid improve pattern"));

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
static FIRST_COMMAND_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@ai\s+(\S+)").expect("valid command-word pattern"));

/// Maps a parsed webhook event to an intent, or nothing when the event
/// should be acknowledged and ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventClassifier {
    bot_account_id: Option<ActorId>,
}

impl EventClassifier {
    /// Creates a classifier that filters notes authored by the given bot
    /// account.
    #[must_use]
    pub const fn new(bot_account_id: Option<ActorId>) -> Self {
        Self { bot_account_id }
    }

    /// Classifies an event. Returns `None` for events with no intent.
    #[must_use]
    pub fn classify(&self, event: &WebhookEvent) -> Option<RoutedEvent> {
        match event {
            WebhookEvent::NoteOnMergeRequest { note, author, .. } => {
                if self.is_bot(*author) {
                    return None;
                }
                Self::classify_mr_note(note)
            }
            WebhookEvent::NoteOnIssue { note, author, .. } => {
                if self.is_bot(*author) {
                    return None;
                }
                Self::classify_issue_note(note)
            }
            WebhookEvent::IssueChanged { labels, .. } => Self::classify_issue_change(labels),
            WebhookEvent::MergeRequest { action, .. } => Some(match action {
                MergeRequestAction::Open | MergeRequestAction::Update => {
                    RoutedEvent::new(Intent::AutoReview)
                }
                MergeRequestAction::Merge => RoutedEvent::new(Intent::AcceptanceTracking),
            }),
            WebhookEvent::Push { .. } => Some(RoutedEvent::new(Intent::IncrementalReview)),
        }
    }

    fn is_bot(&self, author: ActorId) -> bool {
        self.bot_account_id == Some(author)
    }

    /// `@ai review` and `@ai improve` are commands; `@ai ask "…"` extracts
    /// a question; any other `@ai` mention earns a usage hint.
    fn classify_mr_note(note: &str) -> Option<RoutedEvent> {
        if !MENTION.is_match(note) {
            return None;
        }
        if let Some(question) = extract_question(note) {
            return Some(RoutedEvent::new(Intent::AskCommand).with_question(question));
        }
        if REVIEW_COMMAND.is_match(note) {
            return Some(RoutedEvent::new(Intent::OnDemandReview));
        }
        if IMPROVE_COMMAND.is_match(note) {
            return Some(RoutedEvent::new(Intent::Improve));
        }
        Some(
            RoutedEvent::new(Intent::HelpResponse)
                .with_unrecognized_command(extract_command_word(note)),
        )
    }

    /// Any `@ai` mention on an issue opens a discussion; a quoted ask
    /// command still extracts its question.
    fn classify_issue_note(note: &str) -> Option<RoutedEvent> {
        if !MENTION.is_match(note) {
            return None;
        }
        if let Some(question) = extract_question(note) {
            return Some(RoutedEvent::new(Intent::AskCommand).with_question(question));
        }
        Some(RoutedEvent::new(Intent::IssueDiscussion))
    }

    /// Issue open/update both arrive here; only the develop label matters.
    fn classify_issue_change(labels: &[String]) -> Option<RoutedEvent> {
        if labels.iter().any(|label| label == DEVELOP_LABEL) {
            return Some(RoutedEvent::new(Intent::FeatureDev));
        }
        None
    }
}

fn extract_question(note: &str) -> Option<String> {
    ASK_COMMAND
        .captures(note)
        .and_then(|captures| captures.get(1))
        .map(|capture| capture.as_str().trim().to_owned())
}

fn extract_command_word(note: &str) -> String {
    FIRST_COMMAND_WORD
        .captures(note)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| "@ai".to_owned(), |word| format!("@ai {}", word.as_str()))
}
