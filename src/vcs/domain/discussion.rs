//! Discussion thread values returned by the GitLab API.

use super::DiscussionId;
use serde::{Deserialize, Serialize};

/// A discussion thread on a merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    /// Opaque discussion identifier.
    pub id: DiscussionId,
    /// Notes in thread order; the first note carries the thread body.
    pub notes: Vec<DiscussionNote>,
}

impl Discussion {
    /// Returns the first note of the thread, if any.
    #[must_use]
    pub fn first_note(&self) -> Option<&DiscussionNote> {
        self.notes.first()
    }
}

/// A single note inside a discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionNote {
    /// Markdown body of the note.
    pub body: String,
    /// Diff position, present for inline notes.
    pub position: Option<NotePosition>,
    /// Whether the note has been resolved.
    #[serde(default)]
    pub resolved: bool,
}

/// The diff location an inline note is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePosition {
    /// File path on the new side of the diff.
    pub new_path: String,
    /// Line number on the new side of the diff, when line-anchored.
    pub new_line: Option<u32>,
}
