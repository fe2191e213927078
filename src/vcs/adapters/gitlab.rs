//! GitLab REST API implementation of the VCS client port.
//!
//! Authenticates with the bot account's personal access token via the
//! `PRIVATE-TOKEN` header. HTTP 409 responses and duplicate-resource
//! messages are classified as idempotent conflicts so reconciliation can
//! treat them as success.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::vcs::domain::{
    CommitStatusRequest, DiffPosition, Discussion, DiscussionId, DiscussionNote, GitlabProjectId,
    IssueIid, MergeRequestInfo, MergeRequestUpdate, MrIid, NewMergeRequest, NoteId, NotePosition,
    PipelineId,
};
use crate::vcs::ports::{PipelineTriggerRequest, VcsClient, VcsClientError, VcsResult};

/// GitLab REST API client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct NotePayload {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct DiffRefsPayload {
    base_sha: String,
    start_sha: String,
    head_sha: String,
}

#[derive(Debug, Deserialize)]
struct MergeRequestPayload {
    iid: u64,
    source_branch: String,
    sha: String,
    diff_refs: DiffRefsPayload,
}

#[derive(Debug, Deserialize)]
struct ChangePayload {
    new_path: Option<String>,
    old_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangesPayload {
    #[serde(default)]
    changes: Vec<ChangePayload>,
}

#[derive(Debug, Deserialize)]
struct NotePositionPayload {
    new_path: Option<String>,
    new_line: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DiscussionNotePayload {
    body: String,
    position: Option<NotePositionPayload>,
    #[serde(default)]
    resolved: bool,
}

#[derive(Debug, Deserialize)]
struct DiscussionPayload {
    id: String,
    #[serde(default)]
    notes: Vec<DiscussionNotePayload>,
}

#[derive(Debug, Deserialize)]
struct PipelinePayload {
    id: u64,
}

impl From<MergeRequestPayload> for MergeRequestInfo {
    fn from(payload: MergeRequestPayload) -> Self {
        Self {
            iid: MrIid::new(payload.iid),
            source_branch: payload.source_branch,
            head_sha: payload.sha,
            diff_refs: crate::vcs::domain::DiffRefs {
                base_sha: payload.diff_refs.base_sha,
                start_sha: payload.diff_refs.start_sha,
                head_sha: payload.diff_refs.head_sha,
            },
        }
    }
}

impl From<DiscussionPayload> for Discussion {
    fn from(payload: DiscussionPayload) -> Self {
        Self {
            id: DiscussionId::new(payload.id),
            notes: payload
                .notes
                .into_iter()
                .map(|note| DiscussionNote {
                    body: note.body,
                    position: note.position.and_then(|position| {
                        position.new_path.map(|new_path| NotePosition {
                            new_path,
                            new_line: position.new_line,
                        })
                    }),
                    resolved: note.resolved,
                })
                .collect(),
        }
    }
}

impl GitLabClient {
    /// Creates a client against the given GitLab host using the bot
    /// account's personal access token.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn check(response: reqwest::Response) -> VcsResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        if status.as_u16() == 409 || message.contains("already exists") {
            return Err(VcsClientError::Conflict { message });
        }
        Err(VcsClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send(builder: reqwest::RequestBuilder) -> VcsResult<reqwest::Response> {
        let response = builder.send().await.map_err(VcsClientError::transport)?;
        Self::check(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> VcsResult<T> {
        response.json().await.map_err(VcsClientError::transport)
    }
}

#[async_trait]
impl VcsClient for GitLabClient {
    async fn create_mr_note(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        body: &str,
    ) -> VcsResult<NoteId> {
        let response = Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("projects/{project}/merge_requests/{mr_iid}/notes"),
            )
            .json(&json!({ "body": body })),
        )
        .await?;
        let note: NotePayload = Self::decode(response).await?;
        Ok(NoteId::new(note.id))
    }

    async fn update_mr_note(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        note_id: NoteId,
        body: &str,
    ) -> VcsResult<()> {
        Self::send(
            self.request(
                reqwest::Method::PUT,
                &format!("projects/{project}/merge_requests/{mr_iid}/notes/{note_id}"),
            )
            .json(&json!({ "body": body })),
        )
        .await?;
        Ok(())
    }

    async fn create_issue_note(
        &self,
        project: GitlabProjectId,
        issue_iid: IssueIid,
        body: &str,
    ) -> VcsResult<NoteId> {
        let response = Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("projects/{project}/issues/{issue_iid}/notes"),
            )
            .json(&json!({ "body": body })),
        )
        .await?;
        let note: NotePayload = Self::decode(response).await?;
        Ok(NoteId::new(note.id))
    }

    async fn list_mr_discussions(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<Vec<Discussion>> {
        let response = Self::send(
            self.request(
                reqwest::Method::GET,
                &format!("projects/{project}/merge_requests/{mr_iid}/discussions"),
            )
            .query(&[("per_page", "100")]),
        )
        .await?;
        let discussions: Vec<DiscussionPayload> = Self::decode(response).await?;
        Ok(discussions.into_iter().map(Discussion::from).collect())
    }

    async fn create_mr_discussion(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        body: &str,
        position: &DiffPosition,
    ) -> VcsResult<DiscussionId> {
        let response = Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("projects/{project}/merge_requests/{mr_iid}/discussions"),
            )
            .json(&json!({
                "body": body,
                "position": {
                    "base_sha": position.diff_refs.base_sha,
                    "start_sha": position.diff_refs.start_sha,
                    "head_sha": position.diff_refs.head_sha,
                    "position_type": "text",
                    "new_path": position.new_path,
                    "new_line": position.new_line,
                },
            })),
        )
        .await?;
        let discussion: DiscussionPayload = Self::decode(response).await?;
        Ok(DiscussionId::new(discussion.id))
    }

    async fn add_mr_labels(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        labels: &[String],
    ) -> VcsResult<()> {
        Self::send(
            self.request(
                reqwest::Method::PUT,
                &format!("projects/{project}/merge_requests/{mr_iid}"),
            )
            .json(&json!({ "add_labels": labels.join(",") })),
        )
        .await?;
        Ok(())
    }

    async fn remove_mr_labels(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        labels: &[String],
    ) -> VcsResult<()> {
        Self::send(
            self.request(
                reqwest::Method::PUT,
                &format!("projects/{project}/merge_requests/{mr_iid}"),
            )
            .json(&json!({ "remove_labels": labels.join(",") })),
        )
        .await?;
        Ok(())
    }

    async fn set_commit_status(
        &self,
        project: GitlabProjectId,
        sha: &str,
        status: &CommitStatusRequest,
    ) -> VcsResult<()> {
        Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("projects/{project}/statuses/{sha}"),
            )
            .json(&json!({
                "state": status.state.as_str(),
                "name": status.name,
                "description": status.description,
            })),
        )
        .await?;
        Ok(())
    }

    async fn merge_request(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<MergeRequestInfo> {
        let response = Self::send(self.request(
            reqwest::Method::GET,
            &format!("projects/{project}/merge_requests/{mr_iid}"),
        ))
        .await?;
        let payload: MergeRequestPayload = Self::decode(response).await?;
        Ok(payload.into())
    }

    async fn merge_request_changed_paths(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<Vec<String>> {
        let response = Self::send(self.request(
            reqwest::Method::GET,
            &format!("projects/{project}/merge_requests/{mr_iid}/changes"),
        ))
        .await?;
        let payload: ChangesPayload = Self::decode(response).await?;
        Ok(payload
            .changes
            .into_iter()
            .filter_map(|change| change.new_path.or(change.old_path))
            .collect())
    }

    async fn find_open_mr_for_branch(
        &self,
        project: GitlabProjectId,
        source_branch: &str,
    ) -> VcsResult<Option<MergeRequestInfo>> {
        let response = Self::send(
            self.request(
                reqwest::Method::GET,
                &format!("projects/{project}/merge_requests"),
            )
            .query(&[("state", "opened"), ("source_branch", source_branch)]),
        )
        .await?;
        let mut payload: Vec<MergeRequestPayload> = Self::decode(response).await?;
        if payload.is_empty() {
            return Ok(None);
        }
        Ok(Some(payload.swap_remove(0).into()))
    }

    async fn create_merge_request(
        &self,
        project: GitlabProjectId,
        params: &NewMergeRequest,
    ) -> VcsResult<MergeRequestInfo> {
        let response = Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("projects/{project}/merge_requests"),
            )
            .json(&json!({
                "source_branch": params.source_branch,
                "target_branch": params.target_branch,
                "title": params.title,
                "description": params.description,
            })),
        )
        .await?;
        let payload: MergeRequestPayload = Self::decode(response).await?;
        Ok(payload.into())
    }

    async fn update_merge_request(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        params: &MergeRequestUpdate,
    ) -> VcsResult<()> {
        let mut body = serde_json::Map::new();
        if let Some(title) = &params.title {
            body.insert("title".to_owned(), json!(title));
        }
        if let Some(description) = &params.description {
            body.insert("description".to_owned(), json!(description));
        }
        Self::send(
            self.request(
                reqwest::Method::PUT,
                &format!("projects/{project}/merge_requests/{mr_iid}"),
            )
            .json(&serde_json::Value::Object(body)),
        )
        .await?;
        Ok(())
    }

    async fn trigger_pipeline(
        &self,
        project: GitlabProjectId,
        request: &PipelineTriggerRequest,
    ) -> VcsResult<PipelineId> {
        let mut form = vec![
            ("token".to_owned(), request.trigger_token.clone()),
            ("ref".to_owned(), request.ref_name.clone()),
        ];
        for (key, value) in &request.variables {
            form.push((format!("variables[{key}]"), value.clone()));
        }
        let response = Self::send(
            self.request(
                reqwest::Method::POST,
                &format!("projects/{project}/trigger/pipeline"),
            )
            .form(&form),
        )
        .await?;
        let payload: PipelinePayload = Self::decode(response).await?;
        Ok(PipelineId::new(payload.id))
    }
}
