//! Pipeline run domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use super::artifact::GeneratedArtifact;
use super::repository::RepositoryHandle;
use super::slug::Slug;

/// Immutable input to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    pub application_name: String,
    pub application_description: String,
}

/// Provisioning state
///
/// States are strictly ordered; a run only ever moves to the next state or
/// to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RunState {
    Init,
    ContentRequested,
    ArtifactExtracted,
    WorkspaceStaged,
    RepoCreated,
    CodePushed,
    SecretRegistered,
    WorkflowStaged,
    WorkflowPushed,
    DeployDispatched,
    UrlResolved,
    Done,
    Failed,
}

impl RunState {
    /// Successful path, in order
    pub const SEQUENCE: [RunState; 12] = [
        Self::Init,
        Self::ContentRequested,
        Self::ArtifactExtracted,
        Self::WorkspaceStaged,
        Self::RepoCreated,
        Self::CodePushed,
        Self::SecretRegistered,
        Self::WorkflowStaged,
        Self::WorkflowPushed,
        Self::DeployDispatched,
        Self::UrlResolved,
        Self::Done,
    ];

    /// Next state on the successful path, `None` for terminal states
    pub fn next(self) -> Option<RunState> {
        match self {
            Self::Init => Some(Self::ContentRequested),
            Self::ContentRequested => Some(Self::ArtifactExtracted),
            Self::ArtifactExtracted => Some(Self::WorkspaceStaged),
            Self::WorkspaceStaged => Some(Self::RepoCreated),
            Self::RepoCreated => Some(Self::CodePushed),
            Self::CodePushed => Some(Self::SecretRegistered),
            Self::SecretRegistered => Some(Self::WorkflowStaged),
            Self::WorkflowStaged => Some(Self::WorkflowPushed),
            Self::WorkflowPushed => Some(Self::DeployDispatched),
            Self::DeployDispatched => Some(Self::UrlResolved),
            Self::UrlResolved => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::ContentRequested => "ContentRequested",
            Self::ArtifactExtracted => "ArtifactExtracted",
            Self::WorkspaceStaged => "WorkspaceStaged",
            Self::RepoCreated => "RepoCreated",
            Self::CodePushed => "CodePushed",
            Self::SecretRegistered => "SecretRegistered",
            Self::WorkflowStaged => "WorkflowStaged",
            Self::WorkflowPushed => "WorkflowPushed",
            Self::DeployDispatched => "DeployDispatched",
            Self::UrlResolved => "UrlResolved",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Illegal state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run in terminal state {from} cannot advance")]
pub struct TransitionError {
    pub from: RunState,
}

/// Aggregate record of one provisioning run
///
/// Owned by the provisioner for the lifetime of the run and handed back to
/// the caller once it reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub request: ProvisioningRequest,
    pub slug: Slug,
    pub state: RunState,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub artifact: Option<GeneratedArtifact>,
    pub workspace: Option<PathBuf>,
    pub repository: Option<RepositoryHandle>,
    pub secret_registered: bool,
    pub workflow_pushed: bool,
    pub deploy_dispatched: bool,
    pub service_url: Option<String>,
}

impl PipelineRun {
    pub fn new(request: ProvisioningRequest, slug: Slug) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            slug,
            state: RunState::Init,
            started_at: chrono::Utc::now(),
            completed_at: None,
            artifact: None,
            workspace: None,
            repository: None,
            secret_registered: false,
            workflow_pushed: false,
            deploy_dispatched: false,
            service_url: None,
        }
    }

    /// Moves to the next state on the successful path
    pub fn advance(&mut self) -> Result<RunState, TransitionError> {
        let next = self.state.next().ok_or(TransitionError { from: self.state })?;
        self.state = next;
        if next == RunState::Done {
            self.completed_at = Some(chrono::Utc::now());
        }
        Ok(next)
    }

    /// Moves to `Failed`, returning the last state reached
    pub fn fail(&mut self) -> RunState {
        let last = self.state;
        if !last.is_terminal() {
            self.state = RunState::Failed;
            self.completed_at = Some(chrono::Utc::now());
        }
        last
    }
}

/// Public URL the deploy pipeline is expected to produce
///
/// Constructed, never read back from the deploy system.
pub fn predict_service_url(slug: &Slug, project_number: u64, region: &str, domain: &str) -> String {
    format!("https://{slug}-{project_number}.{region}.{domain}")
}
