//! Repository-related API endpoints

use crate::error::{ClientError, Result};
use crate::{SourceHostClient, handle_response};
use launchpad_core::domain::repository::RepositoryHandle;
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct CreateRepository<'a> {
    name: &'a str,
    private: bool,
    auto_init: bool,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    name: String,
    clone_url: String,
    html_url: Option<String>,
}

impl SourceHostClient {
    // =============================================================================
    // Repository Management
    // =============================================================================

    /// Create an empty repository owned by the authenticated account
    ///
    /// # Arguments
    /// * `name` - Repository name, always a run slug
    /// * `private` - Repository visibility
    ///
    /// # Returns
    /// Handle carrying the credential-free clone URL
    ///
    /// # Errors
    /// [`ClientError::NameConflict`] when the account already has a
    /// repository with this name.
    pub async fn create_repository(&self, name: &str, private: bool) -> Result<RepositoryHandle> {
        let response = self
            .request(Method::POST, "/user/repos")
            .json(&CreateRepository {
                name,
                private,
                auto_init: false,
            })
            .send()
            .await?;

        let created: RepositoryResponse = match handle_response(response).await {
            Ok(created) => created,
            Err(ClientError::ApiError { status: 422, message })
                if message.contains("already exists") =>
            {
                return Err(ClientError::NameConflict(name.to_string()));
            }
            Err(e) => return Err(e),
        };

        tracing::info!(repository = %created.name, "repository created");

        Ok(RepositoryHandle {
            name: created.name,
            remote_url: created.clone_url,
            html_url: created.html_url,
        })
    }
}
