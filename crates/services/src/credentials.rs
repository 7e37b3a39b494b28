use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};

use trainer_core::model::PasswordHash;

use crate::error::CredentialError;

const SALT_LEN: usize = 16;

/// One-way hashing capability for user secrets.
///
/// Injected at assembly so the hashing scheme can be swapped without touching
/// account flows. Implementations must be safe to call from concurrent
/// requests.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Hash a secret for storage.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Unavailable` if the hashing backend cannot
    /// service the request.
    async fn hash(&self, secret: &str) -> Result<PasswordHash, CredentialError>;

    /// Check a secret against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::MalformedHash` if the stored value cannot be
    /// interpreted, or `Unavailable` on backend failure.
    async fn verify(&self, secret: &str, stored: &PasswordHash) -> Result<bool, CredentialError>;
}

/// Salted SHA-256 hasher; stored form is `<salt-hex>$<digest-hex>`.
///
/// Each hash draws a fresh random salt, so equal secrets produce distinct
/// stored values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256Hasher;

impl SaltedSha256Hasher {
    fn digest(salt: &[u8], secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl CredentialHasher for SaltedSha256Hasher {
    async fn hash(&self, secret: &str) -> Result<PasswordHash, CredentialError> {
        let mut salt = [0_u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let encoded = format!("{}${}", hex::encode(salt), Self::digest(&salt, secret));
        Ok(PasswordHash::new(encoded))
    }

    async fn verify(&self, secret: &str, stored: &PasswordHash) -> Result<bool, CredentialError> {
        let (salt_hex, digest_hex) = stored
            .as_str()
            .split_once('$')
            .ok_or(CredentialError::MalformedHash)?;
        let salt = hex::decode(salt_hex).map_err(|_| CredentialError::MalformedHash)?;
        Ok(Self::digest(&salt, secret) == digest_hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_accepts_the_secret() {
        let hasher = SaltedSha256Hasher;
        let stored = hasher.hash("correct horse").await.unwrap();
        assert!(hasher.verify("correct horse", &stored).await.unwrap());
        assert!(!hasher.verify("wrong horse", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn equal_secrets_hash_to_distinct_values() {
        let hasher = SaltedSha256Hasher;
        let a = hasher.hash("same secret").await.unwrap();
        let b = hasher.hash("same secret").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn verify_rejects_malformed_stored_hash() {
        let hasher = SaltedSha256Hasher;
        let err = hasher
            .verify("pw", &PasswordHash::new("no-separator"))
            .await
            .unwrap_err();
        assert_eq!(err, CredentialError::MalformedHash);

        let err = hasher
            .verify("pw", &PasswordHash::new("zz-not-hex$digest"))
            .await
            .unwrap_err();
        assert_eq!(err, CredentialError::MalformedHash);
    }
}
