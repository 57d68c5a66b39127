//! Anonymous public-key sealing
//!
//! Wraps the X25519/XSalsa20-Poly1305 sealed box: an ephemeral sender key
//! is generated per call, so ciphertexts carry no sender identity and two
//! seals of the same plaintext never match. The output is compatible with
//! libsodium's `crypto_box_seal`, which is what the source host's secret
//! store expects.

use crypto_box::aead::OsRng;
use crypto_box::{KEY_SIZE, PublicKey};
use launchpad_client::RepositoryPublicKey;
use launchpad_core::domain::repository::SecretBundle;
use thiserror::Error;

/// Sealing errors
#[derive(Debug, Error)]
pub enum SealError {
    #[error("recipient public key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("recipient public key is malformed: {0}")]
    MalformedKey(String),

    #[error("encryption failed")]
    Encryption,
}

/// Seal `plaintext` for the holder of the private half of `recipient_key`
pub fn seal(plaintext: &[u8], recipient_key: &[u8]) -> Result<Vec<u8>, SealError> {
    let bytes: [u8; KEY_SIZE] = recipient_key
        .try_into()
        .map_err(|_| SealError::InvalidKeyLength(recipient_key.len()))?;

    PublicKey::from(bytes)
        .seal(&mut OsRng, plaintext)
        .map_err(|_| SealError::Encryption)
}

/// Seal `plaintext` for a freshly fetched repository key
pub fn seal_for(plaintext: &[u8], key: &RepositoryPublicKey) -> Result<SecretBundle, SealError> {
    let recipient_key = key
        .decode()
        .map_err(|e| SealError::MalformedKey(e.to_string()))?;

    Ok(SecretBundle {
        encrypted_value: seal(plaintext, &recipient_key)?,
        recipient_key_id: key.key_id.clone(),
    })
}
