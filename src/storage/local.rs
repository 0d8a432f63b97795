use super::Storage;
use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage for uploaded images.
///
/// Backs the read-only static serving of stored images: everything written
/// here is reachable under the configured upload URL prefix.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create the storage, ensuring the root directory exists
    pub fn new<P: AsRef<Path>>(root: P) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| AppError::storage(format!("failed to create upload dir: {}", e)))?;

        Ok(Self { root })
    }

    /// Root directory reference
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the root directory is still present
    pub async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
        {
            return Err(AppError::storage(format!("invalid storage key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait::async_trait]
impl Storage for LocalStorage {
    async fn store(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.resolve(key)?;
        fs::write(&path, data)
            .await
            .map_err(|e| AppError::storage(format!("failed to write {}: {}", key, e)))?;

        tracing::debug!("stored image {} ({} bytes)", key, data.len());
        Ok(())
    }

    async fn load(&self, key: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(key)?;
        fs::read(&path)
            .await
            .map_err(|e| AppError::storage(format!("failed to read {}: {}", key, e)))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| AppError::storage(format!("failed to delete {}: {}", key, e)))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        Ok(fs::metadata(&path).await.is_ok())
    }
}
