use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{AccountStore, StoreError};
use crate::models::AccountRecord;

/// In-process account collection for tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<AccountRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `write_all` fail without touching the data.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<AccountRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn write_all(&self, records: &[AccountRecord]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        *self.records.write().await = records.to_vec();
        Ok(())
    }
}
