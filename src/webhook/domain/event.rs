//! Webhook event kinds, the typed event union, and payload parsing.

use crate::task::domain::ProjectRef;
use crate::vcs::domain::{ActorId, IssueIid, MrIid};
use serde_json::Value;

/// Supported GitLab webhook event kinds.
///
/// GitLab names the kind in the `X-Gitlab-Event` header; anything not in
/// this map is acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `Merge Request Hook`.
    MergeRequest,
    /// `Note Hook`.
    Note,
    /// `Issue Hook`.
    Issue,
    /// `Push Hook`.
    Push,
}

impl EventKind {
    /// Maps the `X-Gitlab-Event` header to an event kind.
    #[must_use]
    pub fn from_header(header: &str) -> Option<Self> {
        match header {
            "Merge Request Hook" => Some(Self::MergeRequest),
            "Note Hook" => Some(Self::Note),
            "Issue Hook" => Some(Self::Issue),
            "Push Hook" => Some(Self::Push),
            _ => None,
        }
    }

    /// Returns the internal name used in webhook responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MergeRequest => "merge_request",
            Self::Note => "note",
            Self::Issue => "issue",
            Self::Push => "push",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge request actions intake reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRequestAction {
    /// Merge request opened.
    Open,
    /// Merge request updated (new commits or metadata).
    Update,
    /// Merge request merged.
    Merge,
}

/// Issue actions intake reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAction {
    /// Issue opened.
    Open,
    /// Issue updated (including label changes).
    Update,
}

/// One parsed webhook event, carrying only the fields intake consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A merge request was opened, updated, or merged.
    MergeRequest {
        /// The action GitLab reported.
        action: MergeRequestAction,
        /// Merge request iid.
        mr_iid: MrIid,
        /// Source branch name.
        source_branch: String,
        /// Author of the merge request.
        author: ActorId,
        /// Head commit SHA, when the payload carries one.
        last_commit_sha: Option<String>,
    },
    /// A comment on a merge request.
    NoteOnMergeRequest {
        /// Merge request iid the note is attached to.
        mr_iid: MrIid,
        /// Note body.
        note: String,
        /// Note author.
        author: ActorId,
    },
    /// A comment on an issue.
    NoteOnIssue {
        /// Issue iid the note is attached to.
        issue_iid: IssueIid,
        /// Note body.
        note: String,
        /// Note author.
        author: ActorId,
    },
    /// An issue was opened or updated (labels travel with the payload).
    IssueChanged {
        /// The action GitLab reported.
        action: IssueAction,
        /// Issue iid.
        issue_iid: IssueIid,
        /// Acting user.
        author: ActorId,
        /// Current label titles on the issue.
        labels: Vec<String>,
    },
    /// Commits were pushed to a branch.
    Push {
        /// Pushed branch name (stripped of `refs/heads/`).
        branch: String,
        /// Commit range start.
        before_sha: String,
        /// Commit range end.
        after_sha: String,
        /// Pushing user.
        pusher: ActorId,
    },
}

/// A parsed event together with the project it was delivered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEnvelope {
    /// Project resolved from the webhook secret.
    pub project: ProjectRef,
    /// The parsed event.
    pub event: WebhookEvent,
}

fn u64_field(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

impl WebhookEvent {
    /// Parses a raw GitLab payload into a typed event.
    ///
    /// Returns `None` for payloads missing required fields or carrying
    /// actions intake does not react to; such deliveries are acknowledged
    /// and ignored.
    #[must_use]
    pub fn from_payload(kind: EventKind, payload: &Value) -> Option<Self> {
        match kind {
            EventKind::MergeRequest => Self::parse_merge_request(payload),
            EventKind::Note => Self::parse_note(payload),
            EventKind::Issue => Self::parse_issue(payload),
            EventKind::Push => Self::parse_push(payload),
        }
    }

    fn parse_merge_request(payload: &Value) -> Option<Self> {
        let attrs = payload.get("object_attributes")?;
        let action = match str_field(attrs, "action")? {
            "open" => MergeRequestAction::Open,
            "update" => MergeRequestAction::Update,
            "merge" => MergeRequestAction::Merge,
            _ => return None,
        };
        Some(Self::MergeRequest {
            action,
            mr_iid: MrIid::new(u64_field(attrs, "iid")?),
            source_branch: str_field(attrs, "source_branch").unwrap_or_default().to_owned(),
            author: ActorId::new(u64_field(attrs, "author_id").unwrap_or_default()),
            last_commit_sha: attrs
                .get("last_commit")
                .and_then(|commit| str_field(commit, "id"))
                .map(str::to_owned),
        })
    }

    fn parse_note(payload: &Value) -> Option<Self> {
        let attrs = payload.get("object_attributes")?;
        let note = str_field(attrs, "note").unwrap_or_default().to_owned();
        let author = ActorId::new(u64_field(attrs, "author_id").unwrap_or_default());
        match str_field(attrs, "noteable_type")? {
            "MergeRequest" => Some(Self::NoteOnMergeRequest {
                mr_iid: MrIid::new(u64_field(payload.get("merge_request")?, "iid")?),
                note,
                author,
            }),
            "Issue" => Some(Self::NoteOnIssue {
                issue_iid: IssueIid::new(u64_field(payload.get("issue")?, "iid")?),
                note,
                author,
            }),
            _ => None,
        }
    }

    fn parse_issue(payload: &Value) -> Option<Self> {
        let attrs = payload.get("object_attributes")?;
        let action = match str_field(attrs, "action")? {
            "open" => IssueAction::Open,
            "update" => IssueAction::Update,
            _ => return None,
        };
        let labels = payload
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|label| str_field(label, "title"))
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self::IssueChanged {
            action,
            issue_iid: IssueIid::new(u64_field(attrs, "iid")?),
            author: ActorId::new(u64_field(attrs, "author_id").unwrap_or_default()),
            labels,
        })
    }

    fn parse_push(payload: &Value) -> Option<Self> {
        let ref_name = str_field(payload, "ref")?;
        let branch = ref_name.strip_prefix("refs/heads/").unwrap_or(ref_name);
        Some(Self::Push {
            branch: branch.to_owned(),
            before_sha: str_field(payload, "before").unwrap_or_default().to_owned(),
            after_sha: str_field(payload, "after").unwrap_or_default().to_owned(),
            pusher: ActorId::new(u64_field(payload, "user_id").unwrap_or_default()),
        })
    }

    /// Returns the event kind this variant belongs to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::MergeRequest { .. } => EventKind::MergeRequest,
            Self::NoteOnMergeRequest { .. } | Self::NoteOnIssue { .. } => EventKind::Note,
            Self::IssueChanged { .. } => EventKind::Issue,
            Self::Push { .. } => EventKind::Push,
        }
    }

    /// Returns the acting GitLab user behind the event.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        match self {
            Self::MergeRequest { author, .. }
            | Self::NoteOnMergeRequest { author, .. }
            | Self::NoteOnIssue { author, .. }
            | Self::IssueChanged { author, .. } => *author,
            Self::Push { pusher, .. } => *pusher,
        }
    }

    /// Returns the merge request context carried by the event, when any.
    #[must_use]
    pub const fn mr_iid(&self) -> Option<MrIid> {
        match self {
            Self::MergeRequest { mr_iid, .. } | Self::NoteOnMergeRequest { mr_iid, .. } => {
                Some(*mr_iid)
            }
            _ => None,
        }
    }

    /// Returns the issue context carried by the event, when any.
    #[must_use]
    pub const fn issue_iid(&self) -> Option<IssueIid> {
        match self {
            Self::NoteOnIssue { issue_iid, .. } | Self::IssueChanged { issue_iid, .. } => {
                Some(*issue_iid)
            }
            _ => None,
        }
    }

    /// Returns the commit SHA the event refers to, when any.
    #[must_use]
    pub fn commit_sha(&self) -> Option<&str> {
        match self {
            Self::MergeRequest {
                last_commit_sha, ..
            } => last_commit_sha.as_deref(),
            Self::Push { after_sha, .. } => Some(after_sha),
            _ => None,
        }
    }

    /// Returns whether this event represents new code state that makes
    /// older reviews of the same merge request stale.
    ///
    /// Only pushes and merge request open/update supersede; note events do
    /// not.
    #[must_use]
    pub const fn supersedes_older_reviews(&self) -> bool {
        matches!(
            self,
            Self::Push { .. }
                | Self::MergeRequest {
                    action: MergeRequestAction::Open | MergeRequestAction::Update,
                    ..
                }
        )
    }
}
