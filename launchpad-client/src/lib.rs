//! Launchpad HTTP Clients
//!
//! Typed clients for the upstream services a provisioning run talks to:
//!
//! - [`SourceHostClient`]: repository creation, secret-store public keys,
//!   secret upserts and workflow dispatch on the source-hosting REST API
//! - [`CompletionClient`]: chat-completion requests to the language model
//! - [`MetadataClient`]: numeric project lookup on the cloud metadata server
//!
//! # Example
//!
//! ```no_run
//! use launchpad_client::SourceHostClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SourceHostClient::new("https://api.github.com", "octocat", "ghp_token");
//!
//!     let repo = client.create_repository("demo-app-20261016093000-a1b2", false).await?;
//!     println!("Created repository: {}", repo.remote_url);
//!     Ok(())
//! }
//! ```

mod completion;
pub mod error;
mod metadata;
mod repositories;
mod secrets;
mod workflows;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use completion::CompletionClient;
pub use error::{ClientError, Result};
pub use metadata::{DEFAULT_METADATA_URL, MetadataClient};
pub use secrets::RepositoryPublicKey;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// Media type requested from the source-hosting API
const ACCEPT_JSON: &str = "application/vnd.github+json";
/// Pinned REST API version
const API_VERSION: &str = "2022-11-28";
/// User agent sent with every request; the source host rejects requests without one
pub const USER_AGENT: &str = concat!("launchpad/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the source-hosting REST API
///
/// Every call is scoped to a repository owned by `owner` and authenticated
/// with the bearer `token`. Methods are grouped by concern:
/// - Repository creation
/// - Secret-store public keys and secret upserts
/// - Workflow dispatch
#[derive(Clone)]
pub struct SourceHostClient {
    /// Base URL of the API (e.g., "https://api.github.com")
    base_url: String,
    /// Account that owns created repositories
    owner: String,
    /// Bearer credential
    token: String,
    /// HTTP client instance
    client: Client,
}

impl std::fmt::Debug for SourceHostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceHostClient")
            .field("base_url", &self.base_url)
            .field("owner", &self.owner)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SourceHostClient {
    /// Create a new source-host client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "https://api.github.com")
    /// * `owner` - Account that owns the repositories
    /// * `token` - Bearer credential for that account
    pub fn new(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self::with_client(base_url, owner, token, Client::new())
    }

    /// Create a new source-host client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.into(),
            token: token.into(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Build an authenticated request against `path` (must start with '/')
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "source host request");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    /// Path of a repository-scoped endpoint
    fn repo_path(&self, repo: &str, rest: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, repo, rest)
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
///
/// Checks the status code and returns an appropriate error if the request
/// failed, or deserializes the response body if successful.
pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Handle an API response that returns no content (e.g., PUT or dispatch)
pub(crate) async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(())
}
