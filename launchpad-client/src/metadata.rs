//! Cloud metadata server client

use crate::error::{ClientError, Result};
use reqwest::Client;

/// Metadata server reachable from inside the cloud runtime
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Looks up project facts from the instance metadata server
#[derive(Debug, Clone)]
pub struct MetadataClient {
    base_url: String,
    client: Client,
}

impl Default for MetadataClient {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_URL)
    }
}

impl MetadataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Numeric id of the project the process runs in
    pub async fn project_number(&self) -> Result<u64> {
        let url = format!("{}/project/numeric-project-id", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::api_error(status.as_u16(), body));
        }

        body.trim()
            .parse()
            .map_err(|_| ClientError::ParseError(format!("project number is not numeric: {:?}", body.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;

    async fn numeric_id(headers: HeaderMap) -> (StatusCode, &'static str) {
        if headers.get("metadata-flavor").is_none_or(|v| v != "Google") {
            return (StatusCode::FORBIDDEN, "missing Metadata-Flavor");
        }
        (StatusCode::OK, "123456789012\n")
    }

    #[tokio::test]
    async fn test_project_number() {
        let base = serve(Router::new().route("/project/numeric-project-id", get(numeric_id))).await;
        let number = MetadataClient::new(base).project_number().await.unwrap();
        assert_eq!(number, 123456789012);
    }

    #[tokio::test]
    async fn test_non_numeric_body_is_parse_error() {
        let base = serve(Router::new().route(
            "/project/numeric-project-id",
            get(|| async { "my-project" }),
        ))
        .await;
        let err = MetadataClient::new(base).project_number().await.unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
    }
}
