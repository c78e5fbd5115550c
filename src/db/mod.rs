//! Persistence for the account collection.
//!
//! The whole collection is read and replaced wholesale. Callers that mutate
//! must serialize their read-modify-write cycles (see
//! [`StoreAccountService`](crate::services::StoreAccountService)).

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::AccountRecord;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access account store at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Account store at {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize accounts: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Account store is unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Backing medium for the account collection.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates an empty collection if none exists yet. Idempotent.
    async fn ensure_initialized(&self) -> Result<(), StoreError>;

    /// Returns every record in persisted order.
    async fn read_all(&self) -> Result<Vec<AccountRecord>, StoreError>;

    /// Replaces the entire persisted collection.
    ///
    /// On error the previous collection must still be intact.
    async fn write_all(&self, records: &[AccountRecord]) -> Result<(), StoreError>;
}
