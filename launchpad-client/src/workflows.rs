//! Workflow-related API endpoints

use crate::error::Result;
use crate::{SourceHostClient, handle_empty_response};
use reqwest::Method;
use serde::Serialize;

#[derive(Serialize)]
struct DispatchWorkflow<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

impl SourceHostClient {
    // =============================================================================
    // Workflow Dispatch
    // =============================================================================

    /// Trigger a `workflow_dispatch` run of a workflow
    ///
    /// # Arguments
    /// * `repo` - Repository name
    /// * `workflow_file` - Workflow file name under `.github/workflows` (e.g., "deploy.yml")
    /// * `git_ref` - Branch to run the workflow on
    ///
    /// A freshly pushed workflow may not be known to the source host yet, in
    /// which case it answers 404 or 422; retrying is left to the caller.
    pub async fn dispatch_workflow(&self, repo: &str, workflow_file: &str, git_ref: &str) -> Result<()> {
        let path = self.repo_path(repo, &format!("/actions/workflows/{}/dispatches", workflow_file));
        let response = self
            .request(Method::POST, &path)
            .json(&DispatchWorkflow { git_ref })
            .send()
            .await?;

        handle_empty_response(response).await
    }
}
