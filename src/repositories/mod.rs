pub mod detection;

pub use detection::DetectionRepository;

use crate::{
    error::AppResult,
    models::{DetectionResult, NewDetection},
};

/// Persistence contract for detection records.
///
/// Append-only: an acknowledged `save` must be visible to the next
/// `list_all` call, and nothing ever updates or deletes a record.
#[async_trait::async_trait]
pub trait DetectionStore: Send + Sync {
    /// Persist a new record, assigning its id and timestamp
    async fn save(&self, detection: NewDetection) -> AppResult<DetectionResult>;

    /// All records, newest first
    async fn list_all(&self) -> AppResult<Vec<DetectionResult>>;
}
