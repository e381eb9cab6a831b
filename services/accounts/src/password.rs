//! Argon2id password hashing and verification.
//!
//! Hashes are stored as PHC strings, so the salt and work factor travel with
//! the digest and verification always uses the parameters a hash was made
//! with.

use std::time::Duration;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use tracing::warn;

use crate::error::{AccountError, AccountResult};

/// Argon2 memory cost recommended by the argon2 crate, in KiB.
pub const DEFAULT_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;
/// Argon2 passes recommended by the argon2 crate.
pub const DEFAULT_ITERATIONS: u32 = Params::DEFAULT_T_COST;

/// One-way password hasher with a fixed work factor
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher with the given Argon2id memory cost (KiB) and passes.
    pub fn new(memory_kib: u32, iterations: u32) -> AccountResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AccountError::Hash(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> AccountResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AccountError::Hash(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Check a candidate password against a stored digest.
    ///
    /// A malformed digest is reported the same way as a mismatch.
    pub fn verify(&self, digest: &str, candidate: &str) -> bool {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                return false;
            }
        };

        self.argon2()
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// [`CredentialHasher::hash`] on the blocking pool, bounded by `limit`.
    pub async fn hash_blocking(&self, plaintext: &str, limit: Duration) -> AccountResult<String> {
        let hasher = self.clone();
        let plaintext = plaintext.to_owned();
        let task = tokio::task::spawn_blocking(move || hasher.hash(&plaintext));

        match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(AccountError::Hash(join.to_string())),
            Err(_) => Err(AccountError::Timeout("password hashing")),
        }
    }

    /// [`CredentialHasher::verify`] on the blocking pool, bounded by `limit`.
    pub async fn verify_blocking(
        &self,
        digest: &str,
        candidate: &str,
        limit: Duration,
    ) -> AccountResult<bool> {
        let hasher = self.clone();
        let digest = digest.to_owned();
        let candidate = candidate.to_owned();
        let task = tokio::task::spawn_blocking(move || hasher.verify(&digest, &candidate));

        match tokio::time::timeout(limit, task).await {
            Ok(Ok(matched)) => Ok(matched),
            Ok(Err(join)) => Err(AccountError::Hash(join.to_string())),
            Err(_) => Err(AccountError::Timeout("password verification")),
        }
    }
}
