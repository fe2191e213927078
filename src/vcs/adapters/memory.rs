//! Recording in-memory VCS client for tests and sync mode.
//!
//! Every mutating call is recorded so tests can assert on exactly which
//! GitLab artifacts reconciliation would have produced. Read calls serve
//! pre-seeded fixtures. Created discussions become visible to subsequent
//! `list_mr_discussions` calls, which is what the incremental-review dedup
//! relies on.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::vcs::domain::{
    CommitState, CommitStatusRequest, DiffPosition, Discussion, DiscussionId, DiscussionNote,
    GitlabProjectId, IssueIid, MergeRequestInfo, MergeRequestUpdate, MrIid, NewMergeRequest,
    NoteId, NotePosition, PipelineId,
};
use crate::vcs::ports::{PipelineTriggerRequest, VcsClient, VcsClientError, VcsResult};

/// A note created through the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNote {
    /// Project the note was created in.
    pub project: GitlabProjectId,
    /// Merge request or issue iid the note is attached to.
    pub subject_iid: u64,
    /// Assigned note id.
    pub note_id: NoteId,
    /// Markdown body.
    pub body: String,
}

/// An in-place note update performed through the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNoteUpdate {
    /// Project the note lives in.
    pub project: GitlabProjectId,
    /// Merge request iid the note is attached to.
    pub mr_iid: MrIid,
    /// Updated note id.
    pub note_id: NoteId,
    /// Replacement markdown body.
    pub body: String,
}

/// An inline discussion created through the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDiscussion {
    /// Project the discussion was created in.
    pub project: GitlabProjectId,
    /// Merge request iid.
    pub mr_iid: MrIid,
    /// Thread body.
    pub body: String,
    /// Diff position of the thread anchor.
    pub position: DiffPosition,
}

/// A label mutation performed through the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLabelChange {
    /// Project the merge request lives in.
    pub project: GitlabProjectId,
    /// Merge request iid.
    pub mr_iid: MrIid,
    /// Labels added or removed.
    pub labels: Vec<String>,
}

/// A commit status set through the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommitStatus {
    /// Project the commit belongs to.
    pub project: GitlabProjectId,
    /// Commit SHA the status was set on.
    pub sha: String,
    /// Reported state.
    pub state: CommitState,
    /// Status context name.
    pub name: String,
}

/// A pipeline trigger performed through the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPipeline {
    /// Project the pipeline runs in.
    pub project: GitlabProjectId,
    /// Assigned pipeline id.
    pub pipeline_id: PipelineId,
    /// Trigger parameters, including executor variables.
    pub request: PipelineTriggerRequest,
}

#[derive(Debug, Default)]
struct InMemoryVcsState {
    next_note_id: u64,
    next_pipeline_id: u64,
    next_discussion_seq: u64,
    next_mr_iid: u64,
    mr_notes: Vec<RecordedNote>,
    issue_notes: Vec<RecordedNote>,
    note_updates: Vec<RecordedNoteUpdate>,
    discussions: HashMap<(u64, u64), Vec<Discussion>>,
    created_discussions: Vec<RecordedDiscussion>,
    added_labels: Vec<RecordedLabelChange>,
    removed_labels: Vec<RecordedLabelChange>,
    commit_statuses: Vec<RecordedCommitStatus>,
    merge_requests: HashMap<(u64, u64), MergeRequestInfo>,
    changed_paths: HashMap<(u64, u64), Vec<String>>,
    branch_mrs: HashMap<(u64, String), MrIid>,
    created_mrs: Vec<NewMergeRequest>,
    mr_updates: Vec<(MrIid, MergeRequestUpdate)>,
    triggered: Vec<RecordedPipeline>,
    conflict_on_add_labels: bool,
}

/// Thread-safe recording VCS client double.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVcsClient {
    state: Arc<RwLock<InMemoryVcsState>>,
}

fn lock_error<T>(err: &std::sync::PoisonError<T>) -> VcsClientError {
    VcsClientError::transport(std::io::Error::other(err.to_string()))
}

impl InMemoryVcsClient {
    /// Creates an empty client with no seeded fixtures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> VcsResult<std::sync::RwLockWriteGuard<'_, InMemoryVcsState>> {
        self.state.write().map_err(|err| lock_error(&err))
    }

    fn read(&self) -> VcsResult<std::sync::RwLockReadGuard<'_, InMemoryVcsState>> {
        self.state.read().map_err(|err| lock_error(&err))
    }

    /// Seeds merge request metadata served by [`VcsClient::merge_request`]
    /// and registers its source branch for branch lookup.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned; test-fixture seeding has
    /// no error channel to report through.
    pub fn insert_merge_request(&self, project: GitlabProjectId, info: MergeRequestInfo) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut state = self.state.write().expect("vcs state lock poisoned");
        state
            .branch_mrs
            .insert((project.value(), info.source_branch.clone()), info.iid);
        state
            .merge_requests
            .insert((project.value(), info.iid.value()), info);
    }

    /// Seeds the changed file paths served for a merge request diff.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    pub fn set_changed_paths(&self, project: GitlabProjectId, mr_iid: MrIid, paths: Vec<String>) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut state = self.state.write().expect("vcs state lock poisoned");
        state
            .changed_paths
            .insert((project.value(), mr_iid.value()), paths);
    }

    /// Seeds an existing discussion thread on a merge request.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    pub fn insert_discussion(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        discussion: Discussion,
    ) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut state = self.state.write().expect("vcs state lock poisoned");
        state
            .discussions
            .entry((project.value(), mr_iid.value()))
            .or_default()
            .push(discussion);
    }

    /// Makes the next `add_mr_labels` call fail with an idempotent
    /// conflict, exercising the swallow-as-success path.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    pub fn fail_next_label_add_with_conflict(&self) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut state = self.state.write().expect("vcs state lock poisoned");
        state.conflict_on_add_labels = true;
    }

    /// Returns all merge request notes created so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn created_mr_notes(&self) -> Vec<RecordedNote> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.mr_notes.clone()
    }

    /// Returns all issue notes created so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn created_issue_notes(&self) -> Vec<RecordedNote> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.issue_notes.clone()
    }

    /// Returns all in-place note updates performed so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn note_updates(&self) -> Vec<RecordedNoteUpdate> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.note_updates.clone()
    }

    /// Returns all inline discussions created so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn created_discussions(&self) -> Vec<RecordedDiscussion> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.created_discussions.clone()
    }

    /// Returns all label additions performed so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn added_labels(&self) -> Vec<RecordedLabelChange> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.added_labels.clone()
    }

    /// Returns all label removals performed so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn removed_labels(&self) -> Vec<RecordedLabelChange> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.removed_labels.clone()
    }

    /// Returns all commit statuses set so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn commit_statuses(&self) -> Vec<RecordedCommitStatus> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.commit_statuses.clone()
    }

    /// Returns all merge requests created so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn created_merge_requests(&self) -> Vec<NewMergeRequest> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.created_mrs.clone()
    }

    /// Returns all pipelines triggered so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn triggered_pipelines(&self) -> Vec<RecordedPipeline> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let state = self.state.read().expect("vcs state lock poisoned");
        state.triggered.clone()
    }
}

#[async_trait]
impl VcsClient for InMemoryVcsClient {
    async fn create_mr_note(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        body: &str,
    ) -> VcsResult<NoteId> {
        let mut state = self.write()?;
        state.next_note_id += 1;
        let note_id = NoteId::new(state.next_note_id);
        state.mr_notes.push(RecordedNote {
            project,
            subject_iid: mr_iid.value(),
            note_id,
            body: body.to_owned(),
        });
        Ok(note_id)
    }

    async fn update_mr_note(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        note_id: NoteId,
        body: &str,
    ) -> VcsResult<()> {
        let mut state = self.write()?;
        state.note_updates.push(RecordedNoteUpdate {
            project,
            mr_iid,
            note_id,
            body: body.to_owned(),
        });
        Ok(())
    }

    async fn create_issue_note(
        &self,
        project: GitlabProjectId,
        issue_iid: IssueIid,
        body: &str,
    ) -> VcsResult<NoteId> {
        let mut state = self.write()?;
        state.next_note_id += 1;
        let note_id = NoteId::new(state.next_note_id);
        state.issue_notes.push(RecordedNote {
            project,
            subject_iid: issue_iid.value(),
            note_id,
            body: body.to_owned(),
        });
        Ok(note_id)
    }

    async fn list_mr_discussions(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<Vec<Discussion>> {
        let state = self.read()?;
        Ok(state
            .discussions
            .get(&(project.value(), mr_iid.value()))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_mr_discussion(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        body: &str,
        position: &DiffPosition,
    ) -> VcsResult<DiscussionId> {
        let mut state = self.write()?;
        state.next_discussion_seq += 1;
        let id = DiscussionId::new(format!("disc-{}", state.next_discussion_seq));
        state.created_discussions.push(RecordedDiscussion {
            project,
            mr_iid,
            body: body.to_owned(),
            position: position.clone(),
        });
        state
            .discussions
            .entry((project.value(), mr_iid.value()))
            .or_default()
            .push(Discussion {
                id: id.clone(),
                notes: vec![DiscussionNote {
                    body: body.to_owned(),
                    position: Some(NotePosition {
                        new_path: position.new_path.clone(),
                        new_line: Some(position.new_line),
                    }),
                    resolved: false,
                }],
            });
        Ok(id)
    }

    async fn add_mr_labels(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        labels: &[String],
    ) -> VcsResult<()> {
        let mut state = self.write()?;
        if state.conflict_on_add_labels {
            state.conflict_on_add_labels = false;
            return Err(VcsClientError::Conflict {
                message: "label already exists".to_owned(),
            });
        }
        state.added_labels.push(RecordedLabelChange {
            project,
            mr_iid,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn remove_mr_labels(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        labels: &[String],
    ) -> VcsResult<()> {
        let mut state = self.write()?;
        state.removed_labels.push(RecordedLabelChange {
            project,
            mr_iid,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn set_commit_status(
        &self,
        project: GitlabProjectId,
        sha: &str,
        status: &CommitStatusRequest,
    ) -> VcsResult<()> {
        let mut state = self.write()?;
        state.commit_statuses.push(RecordedCommitStatus {
            project,
            sha: sha.to_owned(),
            state: status.state,
            name: status.name.clone(),
        });
        Ok(())
    }

    async fn merge_request(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<MergeRequestInfo> {
        let state = self.read()?;
        state
            .merge_requests
            .get(&(project.value(), mr_iid.value()))
            .cloned()
            .ok_or(VcsClientError::Api {
                status: 404,
                message: format!("merge request !{mr_iid} not found"),
            })
    }

    async fn merge_request_changed_paths(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<Vec<String>> {
        let state = self.read()?;
        Ok(state
            .changed_paths
            .get(&(project.value(), mr_iid.value()))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_open_mr_for_branch(
        &self,
        project: GitlabProjectId,
        source_branch: &str,
    ) -> VcsResult<Option<MergeRequestInfo>> {
        let state = self.read()?;
        let iid = state
            .branch_mrs
            .get(&(project.value(), source_branch.to_owned()));
        Ok(iid.and_then(|mr_iid| {
            state
                .merge_requests
                .get(&(project.value(), mr_iid.value()))
                .cloned()
        }))
    }

    async fn create_merge_request(
        &self,
        project: GitlabProjectId,
        params: &NewMergeRequest,
    ) -> VcsResult<MergeRequestInfo> {
        let mut state = self.write()?;
        state.next_mr_iid += 1;
        let iid = MrIid::new(state.next_mr_iid + 1000);
        state.created_mrs.push(params.clone());
        let info = MergeRequestInfo {
            iid,
            source_branch: params.source_branch.clone(),
            head_sha: format!("head-{}", iid.value()),
            diff_refs: crate::vcs::domain::DiffRefs {
                base_sha: format!("base-{}", iid.value()),
                start_sha: format!("start-{}", iid.value()),
                head_sha: format!("head-{}", iid.value()),
            },
        };
        state
            .branch_mrs
            .insert((project.value(), params.source_branch.clone()), iid);
        state
            .merge_requests
            .insert((project.value(), iid.value()), info.clone());
        Ok(info)
    }

    async fn update_merge_request(
        &self,
        _project: GitlabProjectId,
        mr_iid: MrIid,
        params: &MergeRequestUpdate,
    ) -> VcsResult<()> {
        let mut state = self.write()?;
        state.mr_updates.push((mr_iid, params.clone()));
        Ok(())
    }

    async fn trigger_pipeline(
        &self,
        project: GitlabProjectId,
        request: &PipelineTriggerRequest,
    ) -> VcsResult<PipelineId> {
        let mut state = self.write()?;
        state.next_pipeline_id += 1;
        let pipeline_id = PipelineId::new(state.next_pipeline_id + 9000);
        state.triggered.push(RecordedPipeline {
            project,
            pipeline_id,
            request: request.clone(),
        });
        Ok(pipeline_id)
    }
}
