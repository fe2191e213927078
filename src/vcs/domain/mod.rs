//! Value types shared across the GitLab capability boundary.

mod discussion;
mod ids;
mod merge_request;

pub use discussion::{Discussion, DiscussionNote, NotePosition};
pub use ids::{ActorId, DiscussionId, GitlabProjectId, IssueIid, MrIid, NoteId, PipelineId};
pub use merge_request::{
    CommitState, CommitStatusRequest, DiffPosition, DiffRefs, MergeRequestInfo, MergeRequestUpdate,
    NewMergeRequest,
};
