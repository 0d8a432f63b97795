use crate::error::AppResult;
use sha2::{Digest, Sha256};
use tokio::task;

/// Image content hasher. The SHA256 doubles as the storage key, so repeated
/// uploads of the same photo land on the same artifact.
pub struct ImageHasher;

impl ImageHasher {
    /// Create a new image hasher
    pub fn new() -> Self {
        Self
    }

    /// Compute the SHA256 of an image payload off the async runtime
    pub async fn calculate_sha256(&self, data: &[u8]) -> AppResult<String> {
        let data = data.to_vec();

        let hash = task::spawn_blocking(move || Self::sha256_hex(&data))
            .await
            .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;

        Ok(hash)
    }

    /// SHA256 as a lowercase hex string
    pub fn sha256_hex(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        Digest::update(&mut hasher, data);
        hex::encode(hasher.finalize())
    }
}

impl Default for ImageHasher {
    fn default() -> Self {
        Self::new()
    }
}
