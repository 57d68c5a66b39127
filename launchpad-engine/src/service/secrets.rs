//! Secret provisioning
//!
//! Registers a named secret on a repository: fetch the current public key,
//! seal the plaintext for it, upsert the sealed value. The key is fetched on
//! every call and never cached, so remote key rotation is tolerated.

use launchpad_client::ClientError;
use launchpad_core::domain::repository::RepositoryHandle;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::seal::{SealError, seal_for};
use crate::service::SourceHost;

/// Secret registration errors
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to fetch repository public key: {0}")]
    KeyFetch(#[source] ClientError),

    #[error("failed to seal secret: {0}")]
    Seal(#[from] SealError),

    #[error("failed to store secret: {0}")]
    Upsert(#[source] ClientError),
}

/// Registers sealed secrets on repositories
#[derive(Clone)]
pub struct SecretProvisioner {
    host: Arc<dyn SourceHost>,
}

impl SecretProvisioner {
    pub fn new(host: Arc<dyn SourceHost>) -> Self {
        Self { host }
    }

    /// Creates or replaces secret `name` on `repository`
    ///
    /// Safe to repeat: the remote side treats a PUT of an existing name as
    /// a replacement.
    pub async fn register_secret(
        &self,
        repository: &RepositoryHandle,
        name: &str,
        plaintext: &[u8],
    ) -> Result<(), SecretError> {
        let key = self
            .host
            .get_public_key(&repository.name)
            .await
            .map_err(SecretError::KeyFetch)?;
        debug!(key_id = %key.key_id, "fetched repository public key");

        let bundle = seal_for(plaintext, &key)?;

        self.host
            .put_secret(&repository.name, name, &bundle)
            .await
            .map_err(SecretError::Upsert)?;

        info!(secret = name, repository = %repository.name, "secret registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use crypto_box::SecretKey;
    use crypto_box::aead::OsRng;
    use launchpad_client::RepositoryPublicKey;
    use launchpad_core::domain::repository::SecretBundle;
    use std::sync::Mutex;

    /// Secret store that rotates its key on every fetch
    struct RotatingStore {
        keys: Mutex<Vec<(String, SecretKey)>>,
        stored: Mutex<Vec<(String, SecretBundle)>>,
    }

    impl RotatingStore {
        fn new() -> Self {
            Self {
                keys: Mutex::new(Vec::new()),
                stored: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SourceHost for RotatingStore {
        async fn create_repository(&self, _: &str, _: bool) -> Result<RepositoryHandle, ClientError> {
            unreachable!()
        }

        async fn get_public_key(&self, _repo: &str) -> Result<RepositoryPublicKey, ClientError> {
            let mut keys = self.keys.lock().unwrap();
            let secret = SecretKey::generate(&mut OsRng);
            let key_id = format!("key-{}", keys.len());
            let public = RepositoryPublicKey {
                key_id: key_id.clone(),
                key: STANDARD.encode(secret.public_key().as_bytes()),
            };
            keys.push((key_id, secret));
            Ok(public)
        }

        async fn put_secret(&self, _repo: &str, name: &str, bundle: &SecretBundle) -> Result<(), ClientError> {
            self.stored
                .lock()
                .unwrap()
                .push((name.to_string(), bundle.clone()));
            Ok(())
        }

        async fn dispatch_workflow(&self, _: &str, _: &str, _: &str) -> Result<(), ClientError> {
            unreachable!()
        }
    }

    fn repository() -> RepositoryHandle {
        RepositoryHandle {
            name: "demo".to_string(),
            remote_url: "https://github.com/octocat/demo.git".to_string(),
            html_url: None,
        }
    }

    #[tokio::test]
    async fn test_each_registration_uses_a_fresh_key() {
        let store = Arc::new(RotatingStore::new());
        let provisioner = SecretProvisioner::new(store.clone());

        provisioner
            .register_secret(&repository(), "GCP_SA_KEY", b"{\"a\":1}")
            .await
            .unwrap();
        provisioner
            .register_secret(&repository(), "GCP_SA_KEY", b"{\"a\":2}")
            .await
            .unwrap();

        let keys = store.keys.lock().unwrap();
        let stored = store.stored.lock().unwrap();
        assert_eq!(stored.len(), 2);

        for ((key_id, secret), (name, bundle)) in keys.iter().zip(stored.iter()) {
            assert_eq!(name, "GCP_SA_KEY");
            assert_eq!(&bundle.recipient_key_id, key_id);
            assert!(secret.unseal(&bundle.encrypted_value).is_ok());
        }
        assert_eq!(keys[1].1.unseal(&stored[1].1.encrypted_value).unwrap(), b"{\"a\":2}");
    }

    struct FailingStore;

    #[async_trait]
    impl SourceHost for FailingStore {
        async fn create_repository(&self, _: &str, _: bool) -> Result<RepositoryHandle, ClientError> {
            unreachable!()
        }

        async fn get_public_key(&self, _repo: &str) -> Result<RepositoryPublicKey, ClientError> {
            Err(ClientError::api_error(403, "Resource not accessible by integration"))
        }

        async fn put_secret(&self, _: &str, _: &str, _: &SecretBundle) -> Result<(), ClientError> {
            unreachable!()
        }

        async fn dispatch_workflow(&self, _: &str, _: &str, _: &str) -> Result<(), ClientError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_key_fetch_failure_is_reported() {
        let provisioner = SecretProvisioner::new(Arc::new(FailingStore));
        let err = provisioner
            .register_secret(&repository(), "GCP_SA_KEY", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::KeyFetch(_)));
    }
}
