//! Usage hint for unrecognized `@ai` commands.

use std::sync::Arc;
use tracing::info;

use super::ReconcileError;
use crate::task::domain::ProjectRef;
use crate::vcs::domain::MrIid;
use crate::vcs::ports::VcsClient;

/// Posts a short command reference when someone mentions the bot with a
/// command it does not know.
#[derive(Clone)]
pub struct HelpResponsePoster {
    vcs: Arc<dyn VcsClient>,
}

impl HelpResponsePoster {
    /// Creates a poster.
    #[must_use]
    pub fn new(vcs: Arc<dyn VcsClient>) -> Self {
        Self { vcs }
    }

    /// Posts the usage hint on the merge request.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the note API fails.
    pub async fn post(
        &self,
        project: ProjectRef,
        mr_iid: MrIid,
        command: &str,
    ) -> Result<(), ReconcileError> {
        let body = format!(
            "### 🤖 Unrecognized command: `{command}`\n\n\
             Supported commands:\n\
             - `@ai review` — run a code review\n\
             - `@ai improve` — suggest improvements\n\
             - `@ai ask \"<question>\"` — answer a question about this MR"
        );
        self.vcs
            .create_mr_note(project.gitlab_project_id, mr_iid, &body)
            .await?;
        info!(mr_iid = %mr_iid, command = command, "help response posted");
        Ok(())
    }
}
