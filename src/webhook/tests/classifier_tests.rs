//! Unit tests for intent classification.

use rstest::rstest;

use crate::task::domain::{Intent, TaskPriority};
use crate::vcs::domain::{ActorId, IssueIid, MrIid};
use crate::webhook::domain::{IssueAction, MergeRequestAction, WebhookEvent};
use crate::webhook::services::EventClassifier;

const BOT: ActorId = ActorId::new(999);
const HUMAN: ActorId = ActorId::new(5);

fn classifier() -> EventClassifier {
    EventClassifier::new(Some(BOT))
}

fn mr_note(author: ActorId, note: &str) -> WebhookEvent {
    WebhookEvent::NoteOnMergeRequest {
        mr_iid: MrIid::new(10),
        note: note.to_owned(),
        author,
    }
}

fn issue_note(author: ActorId, note: &str) -> WebhookEvent {
    WebhookEvent::NoteOnIssue {
        issue_iid: IssueIid::new(3),
        note: note.to_owned(),
        author,
    }
}

#[rstest]
fn ask_command_extracts_the_quoted_question() {
    let routed = classifier()
        .classify(&mr_note(HUMAN, r#"@ai ask "  Why is this cached?  ""#))
        .expect("ask command routes");

    assert_eq!(routed.intent, Intent::AskCommand);
    assert_eq!(routed.question.as_deref(), Some("Why is this cached?"));
    assert_eq!(routed.priority, TaskPriority::Normal);
}

#[rstest]
fn ask_wins_over_review_when_both_appear() {
    let routed = classifier()
        .classify(&mr_note(HUMAN, r#"@ai ask "should we review this?""#))
        .expect("ask command routes");

    assert_eq!(routed.intent, Intent::AskCommand);
}

#[rstest]
fn review_command_on_mr_is_high_priority() {
    let routed = classifier()
        .classify(&mr_note(HUMAN, "Looks odd. @ai review please"))
        .expect("review command routes");

    assert_eq!(routed.intent, Intent::OnDemandReview);
    assert_eq!(routed.priority, TaskPriority::High);
}

#[rstest]
fn improve_command_routes_normal_priority() {
    let routed = classifier()
        .classify(&mr_note(HUMAN, "@ai improve"))
        .expect("improve command routes");

    assert_eq!(routed.intent, Intent::Improve);
    assert_eq!(routed.priority, TaskPriority::Normal);
}

#[rstest]
fn unrecognized_command_earns_a_help_response() {
    let routed = classifier()
        .classify(&mr_note(HUMAN, "@ai reviw this"))
        .expect("mention routes");

    assert_eq!(routed.intent, Intent::HelpResponse);
    assert_eq!(routed.unrecognized_command.as_deref(), Some("@ai reviw"));
}

#[rstest]
fn bot_notes_are_discarded_before_command_parsing() {
    assert!(classifier().classify(&mr_note(BOT, "@ai review")).is_none());
    assert!(classifier().classify(&issue_note(BOT, "@ai hello")).is_none());
}

#[rstest]
fn note_without_mention_is_ignored() {
    assert!(
        classifier()
            .classify(&mr_note(HUMAN, "looks good to me"))
            .is_none()
    );
}

#[rstest]
fn mention_on_issue_opens_a_discussion() {
    let routed = classifier()
        .classify(&issue_note(HUMAN, "@ai what do you think?"))
        .expect("issue mention routes");

    assert_eq!(routed.intent, Intent::IssueDiscussion);
}

#[rstest]
fn ask_on_issue_still_extracts_the_question() {
    let routed = classifier()
        .classify(&issue_note(HUMAN, r#"@ai ask "is this a dup?""#))
        .expect("ask on issue routes");

    assert_eq!(routed.intent, Intent::AskCommand);
    assert_eq!(routed.question.as_deref(), Some("is this a dup?"));
}

#[rstest]
fn develop_label_on_issue_requests_feature_dev() {
    let event = WebhookEvent::IssueChanged {
        action: IssueAction::Update,
        issue_iid: IssueIid::new(3),
        author: HUMAN,
        labels: vec!["backend".to_owned(), "ai::develop".to_owned()],
    };

    let routed = classifier().classify(&event).expect("label routes");

    assert_eq!(routed.intent, Intent::FeatureDev);
    assert_eq!(routed.priority, TaskPriority::Low);
}

#[rstest]
fn issue_without_develop_label_is_ignored() {
    let event = WebhookEvent::IssueChanged {
        action: IssueAction::Update,
        issue_iid: IssueIid::new(3),
        author: HUMAN,
        labels: vec!["backend".to_owned()],
    };

    assert!(classifier().classify(&event).is_none());
}

#[rstest]
#[case(MergeRequestAction::Open)]
#[case(MergeRequestAction::Update)]
fn mr_open_and_update_get_automatic_reviews(#[case] action: MergeRequestAction) {
    let event = WebhookEvent::MergeRequest {
        action,
        mr_iid: MrIid::new(10),
        source_branch: "feature/x".to_owned(),
        author: HUMAN,
        last_commit_sha: None,
    };

    let routed = classifier().classify(&event).expect("mr event routes");

    assert_eq!(routed.intent, Intent::AutoReview);
}

#[rstest]
fn mr_merge_feeds_acceptance_tracking() {
    let event = WebhookEvent::MergeRequest {
        action: MergeRequestAction::Merge,
        mr_iid: MrIid::new(10),
        source_branch: "feature/x".to_owned(),
        author: HUMAN,
        last_commit_sha: None,
    };

    let routed = classifier().classify(&event).expect("merge routes");

    assert_eq!(routed.intent, Intent::AcceptanceTracking);
}

#[rstest]
fn pushes_classify_as_incremental_review() {
    let event = WebhookEvent::Push {
        branch: "feature/x".to_owned(),
        before_sha: "a".to_owned(),
        after_sha: "b".to_owned(),
        pusher: HUMAN,
    };

    let routed = classifier().classify(&event).expect("push routes");

    assert_eq!(routed.intent, Intent::IncrementalReview);
}
