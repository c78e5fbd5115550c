use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::models::AccountRecord;

/// Account collection kept as a single pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sibling of the target so the final rename stays on one filesystem.
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "accounts".into(), |n| n.to_string_lossy().into_owned());
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()))
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        if exists {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        // Linking fails if the target exists, so a document written by a
        // concurrent mutation is never replaced with an empty one.
        let temp_path = self.temp_path();
        fs::write(&temp_path, "[]")
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;
        let linked = fs::hard_link(&temp_path, &self.path).await;
        let _ = fs::remove_file(&temp_path).await;

        match linked {
            Ok(()) => {
                info!("Initialized empty account store at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Account store appeared during initialization");
                Ok(())
            }
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    async fn read_all(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_all(&self, records: &[AccountRecord]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(records).map_err(StoreError::Serialize)?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, content)
            .await
            .map_err(|e| StoreError::io(&temp_path, e))?;

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(&self.path, e));
        }

        debug!(
            count = records.len(),
            "Wrote account store {}",
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("ethicslab-store-{}", Uuid::new_v4()))
            .join("users.json")
    }

    #[tokio::test]
    async fn ensure_initialized_creates_empty_document() {
        let path = scratch_path();
        let store = JsonFileStore::new(&path);

        store.ensure_initialized().await.unwrap();
        assert!(path.exists());
        assert!(store.read_all().await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn initialization_never_replaces_an_existing_document() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[\"kept\"]").unwrap();

        let store = JsonFileStore::new(&path);
        store.ensure_initialized().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[\"kept\"]");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn temp_file_is_not_left_behind() {
        let path = scratch_path();
        let store = JsonFileStore::new(&path);
        store.ensure_initialized().await.unwrap();
        store.write_all(&[]).await.unwrap();

        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
