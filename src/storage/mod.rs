pub mod local;

pub use local::LocalStorage;

use crate::error::AppResult;

/// Storage abstraction for uploaded images.
///
/// Keys are flat, content-addressed names (`<sha256>.<ext>`); the store never
/// interprets them as paths.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Write an image under the given key
    async fn store(&self, key: &str, data: &[u8]) -> AppResult<()>;

    /// Read an image back
    async fn load(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Remove an image
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists
    async fn exists(&self, key: &str) -> AppResult<bool>;
}
