//! Run-level error types

use launchpad_client::ClientError;
use launchpad_core::domain::run::{PipelineRun, RunState, TransitionError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::service::SecretError;
use crate::vcs::VcsError;
use crate::workspace::WorkspaceError;

/// Why a run stopped
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Required process-wide setting absent or invalid
    #[error("configuration error: {0}")]
    ConfigurationMissing(#[from] ConfigError),

    /// Completion service unreachable or non-success
    #[error("completion request failed: {0}")]
    UpstreamRequestFailed(#[source] ClientError),

    #[error("workspace staging failed: {0}")]
    WorkspaceFailed(#[from] WorkspaceError),

    /// Repository name already exists; retry with a fresh slug
    #[error("repository {name} already exists")]
    NameConflict { name: String },

    #[error("repository creation failed: {0}")]
    RepositoryCreationFailed(#[source] ClientError),

    /// Local commit or remote push failed
    #[error("version control failed: {0}")]
    VersionControlFailed(#[from] VcsError),

    #[error("secret registration failed: {0}")]
    SecretRegistrationFailed(#[from] SecretError),

    /// Workflow trigger rejected
    #[error("workflow dispatch failed: {0}")]
    DispatchFailed(#[source] ClientError),

    /// Project lookup failed; the service may still deploy
    #[error("service url resolution failed: {0}")]
    ResolutionFailed(#[source] ClientError),

    #[error("step towards {state} timed out")]
    Timeout { state: RunState },

    #[error("run cancelled before {state}")]
    Cancelled { state: RunState },

    /// The state machine was asked to move past a terminal state
    #[error("illegal transition: {0}")]
    InvalidTransition(#[from] TransitionError),
}

impl ProvisionError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "ConfigurationMissing",
            Self::UpstreamRequestFailed(_) => "UpstreamRequestFailed",
            Self::WorkspaceFailed(_) => "WorkspaceFailed",
            Self::NameConflict { .. } => "NameConflict",
            Self::RepositoryCreationFailed(_) => "RepositoryCreationFailed",
            Self::VersionControlFailed(_) => "VersionControlFailed",
            Self::SecretRegistrationFailed(_) => "SecretRegistrationFailed",
            Self::DispatchFailed(_) => "DispatchFailed",
            Self::ResolutionFailed(_) => "ResolutionFailed",
            Self::Timeout { .. } => "Timeout",
            Self::Cancelled { .. } => "Cancelled",
            Self::InvalidTransition(_) => "InvalidTransition",
        }
    }
}

/// A run that reached `Failed`
///
/// `last_state` is the last state whose side effects completed; `failed_at`
/// is the state the run was trying to reach.
#[derive(Debug, Error)]
#[error("run failed after {last_state} while reaching {failed_at}: {error}")]
pub struct RunFailure {
    pub last_state: RunState,
    pub failed_at: RunState,
    #[source]
    pub error: ProvisionError,
    pub run: Box<PipelineRun>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let err = ProvisionError::Timeout {
            state: RunState::CodePushed,
        };
        assert_eq!(err.kind(), "Timeout");
        assert_eq!(err.to_string(), "step towards CodePushed timed out");

        let err = ProvisionError::NameConflict {
            name: "demo".to_string(),
        };
        assert_eq!(err.kind(), "NameConflict");
    }

    #[test]
    fn test_transition_error_converts() {
        let err: ProvisionError = TransitionError { from: RunState::Done }.into();
        assert_eq!(err.kind(), "InvalidTransition");
        assert_eq!(
            err.to_string(),
            "illegal transition: run in terminal state Done cannot advance"
        );
    }

    #[test]
    fn test_local_and_push_failures_stay_distinct() {
        let local: ProvisionError = VcsError::Local {
            step: "commit",
            stderr: "nothing".to_string(),
        }
        .into();
        let push: ProvisionError = VcsError::Push {
            reason: "rejected".to_string(),
        }
        .into();

        assert!(matches!(local, ProvisionError::VersionControlFailed(ref e) if e.is_local()));
        assert!(matches!(push, ProvisionError::VersionControlFailed(ref e) if !e.is_local()));
    }
}
