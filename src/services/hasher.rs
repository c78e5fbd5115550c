//! One-way hashing of account secrets.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Invalid Argon2 params: {0}")]
    Params(String),

    #[error("Failed to hash secret: {0}")]
    Hash(String),

    #[error("Invalid credential hash format: {0}")]
    MalformedHash(String),

    #[error("Hashing task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Swappable hashing capability so cost and algorithm stay out of business logic.
#[async_trait]
pub trait SecretHasher: Send + Sync {
    async fn hash(&self, plain: &str) -> Result<String, HashError>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    async fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashError>;
}

/// Argon2id hasher producing PHC strings with a random salt.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| HashError::Params(e.to_string()))?;

        Ok(Self { params })
    }
}

#[async_trait]
impl SecretHasher for Argon2Hasher {
    async fn hash(&self, plain: &str) -> Result<String, HashError> {
        let params = self.params.clone();
        let plain = plain.to_string();

        // Argon2 is CPU-bound; keep it off the async workers.
        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                .hash_password(plain.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| HashError::Hash(e.to_string()))
        })
        .await?
    }

    async fn verify(&self, plain: &str, hash: &str) -> Result<bool, HashError> {
        let plain = plain.to_string();
        let hash = hash.to_string();

        task::spawn_blocking(move || {
            let parsed =
                PasswordHash::new(&hash).map_err(|e| HashError::MalformedHash(e.to_string()))?;

            // Parameters come from the PHC string, so older hashes keep verifying
            // after a cost change.
            Ok(Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok())
        })
        .await?
    }
}
