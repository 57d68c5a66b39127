//! Remote repository domain types

use serde::{Deserialize, Serialize};

/// Repository created for a run
///
/// `name` is always the run slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryHandle {
    pub name: String,
    /// Clone URL, without credentials
    pub remote_url: String,
    pub html_url: Option<String>,
}

/// Sealed secret ready for one upsert
///
/// Built from a freshly fetched public key and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBundle {
    pub encrypted_value: Vec<u8>,
    pub recipient_key_id: String,
}

impl std::fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBundle")
            .field("encrypted_value", &format_args!("<{} bytes>", self.encrypted_value.len()))
            .field("recipient_key_id", &self.recipient_key_id)
            .finish()
    }
}
