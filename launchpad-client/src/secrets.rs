//! Secret-store API endpoints

use crate::error::{ClientError, Result};
use crate::{SourceHostClient, handle_empty_response, handle_response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use launchpad_core::domain::repository::SecretBundle;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Current public key of a repository's secret store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryPublicKey {
    pub key_id: String,
    /// Base64 encoded key bytes
    pub key: String,
}

impl RepositoryPublicKey {
    /// Decoded key bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.key.trim())
            .map_err(|e| ClientError::ParseError(format!("public key is not valid base64: {}", e)))
    }
}

#[derive(Serialize)]
struct PutSecret<'a> {
    encrypted_value: String,
    key_id: &'a str,
}

impl SourceHostClient {
    // =============================================================================
    // Repository Secrets
    // =============================================================================

    /// Fetch the current public key of a repository's secret store
    ///
    /// The key can rotate; callers fetch it right before every seal.
    pub async fn get_public_key(&self, repo: &str) -> Result<RepositoryPublicKey> {
        let path = self.repo_path(repo, "/actions/secrets/public-key");
        let response = self.request(Method::GET, &path).send().await?;

        handle_response(response).await
    }

    /// Create or replace a named repository secret
    ///
    /// # Arguments
    /// * `repo` - Repository name
    /// * `name` - Secret name
    /// * `bundle` - Sealed value and the id of the key it was sealed for
    pub async fn put_secret(&self, repo: &str, name: &str, bundle: &SecretBundle) -> Result<()> {
        let path = self.repo_path(repo, &format!("/actions/secrets/{}", name));
        let response = self
            .request(Method::PUT, &path)
            .json(&PutSecret {
                encrypted_value: STANDARD.encode(&bundle.encrypted_value),
                key_id: &bundle.recipient_key_id,
            })
            .send()
            .await?;

        handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use crate::SourceHostClient;
    use crate::test_support::serve;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use launchpad_core::domain::repository::SecretBundle;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    async fn public_key(Path((owner, repo)): Path<(String, String)>) -> Json<Value> {
        assert_eq!(owner, "octocat");
        assert_eq!(repo, "demo");
        Json(json!({"key_id": "568250167242549743", "key": STANDARD.encode([7u8; 32])}))
    }

    async fn upsert(
        State(captured): State<Captured>,
        Path((_owner, _repo, name)): Path<(String, String, String)>,
        Json(body): Json<Value>,
    ) -> StatusCode {
        captured.lock().unwrap().push((name, body));
        StatusCode::CREATED
    }

    async fn client() -> (SourceHostClient, Captured) {
        let captured = Captured::default();
        let router = Router::new()
            .route("/repos/{owner}/{repo}/actions/secrets/public-key", get(public_key))
            .route("/repos/{owner}/{repo}/actions/secrets/{name}", put(upsert))
            .with_state(captured.clone());
        let base = serve(router).await;
        (SourceHostClient::new(base, "octocat", "t"), captured)
    }

    #[tokio::test]
    async fn test_get_public_key_decodes() {
        let (client, _) = client().await;
        let key = client.get_public_key("demo").await.unwrap();

        assert_eq!(key.key_id, "568250167242549743");
        assert_eq!(key.decode().unwrap(), vec![7u8; 32]);
    }

    #[tokio::test]
    async fn test_put_secret_sends_base64_and_key_id() {
        let (client, captured) = client().await;
        let bundle = SecretBundle {
            encrypted_value: vec![1, 2, 3, 250],
            recipient_key_id: "kid-1".to_string(),
        };

        client.put_secret("demo", "GCP_SA_KEY", &bundle).await.unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (name, body) = &captured[0];
        assert_eq!(name, "GCP_SA_KEY");
        assert_eq!(body["encrypted_value"], STANDARD.encode([1u8, 2, 3, 250]));
        assert_eq!(body["key_id"], "kid-1");
    }

    #[tokio::test]
    async fn test_unknown_repository_is_not_found() {
        let (client, _) = client().await;
        let bundle = SecretBundle {
            encrypted_value: vec![],
            recipient_key_id: "k".into(),
        };

        let err = client.put_secret("demo/extra", "X", &bundle).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_key_is_parse_error() {
        let key = crate::RepositoryPublicKey {
            key_id: "k".into(),
            key: "not base64!".into(),
        };
        assert!(matches!(key.decode(), Err(crate::ClientError::ParseError(_))));
    }
}
