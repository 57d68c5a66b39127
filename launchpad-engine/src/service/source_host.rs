//! Source-hosting API seam

use async_trait::async_trait;
use launchpad_client::{ClientError, RepositoryPublicKey, SourceHostClient};
use launchpad_core::domain::repository::{RepositoryHandle, SecretBundle};

/// Repository, secret-store and workflow operations on the source host
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Creates a repository; an existing name is [`ClientError::NameConflict`]
    async fn create_repository(&self, name: &str, private: bool) -> Result<RepositoryHandle, ClientError>;

    /// Current public key of the repository's secret store
    async fn get_public_key(&self, repo: &str) -> Result<RepositoryPublicKey, ClientError>;

    /// Creates or replaces a named secret
    async fn put_secret(&self, repo: &str, name: &str, bundle: &SecretBundle) -> Result<(), ClientError>;

    /// Triggers a workflow run on `git_ref`
    async fn dispatch_workflow(&self, repo: &str, workflow_file: &str, git_ref: &str) -> Result<(), ClientError>;
}

#[async_trait]
impl SourceHost for SourceHostClient {
    async fn create_repository(&self, name: &str, private: bool) -> Result<RepositoryHandle, ClientError> {
        SourceHostClient::create_repository(self, name, private).await
    }

    async fn get_public_key(&self, repo: &str) -> Result<RepositoryPublicKey, ClientError> {
        SourceHostClient::get_public_key(self, repo).await
    }

    async fn put_secret(&self, repo: &str, name: &str, bundle: &SecretBundle) -> Result<(), ClientError> {
        SourceHostClient::put_secret(self, repo, name, bundle).await
    }

    async fn dispatch_workflow(&self, repo: &str, workflow_file: &str, git_ref: &str) -> Result<(), ClientError> {
        SourceHostClient::dispatch_workflow(self, repo, workflow_file, git_ref).await
    }
}
