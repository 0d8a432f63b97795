use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Infestation severity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "severity_enum", rename_all = "PascalCase")]
pub enum Severity {
    /// Minor presence, monitoring is usually enough
    Low,
    /// Established infestation, treatment recommended
    Medium,
    /// Widespread infestation, immediate treatment needed
    High,
}

impl Severity {
    /// Bucket a percent-scale confidence value into a severity.
    ///
    /// The classifier only reports how certain it is about the label; the
    /// buckets treat a confident identification as a more established
    /// infestation.
    pub fn from_confidence(confidence_pct: f64) -> Self {
        if confidence_pct >= 75.0 {
            Severity::High
        } else if confidence_pct >= 40.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// One persisted pest detection record.
///
/// Records are append-only: no update or delete path exists anywhere in the
/// service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Record identifier (UUID v4), assigned at creation
    pub id: Uuid,
    /// Storage key of the analyzed image, served under the upload prefix
    pub image_ref: String,
    /// Pest label reported by the classification service
    pub pest_label: String,
    /// Classifier confidence, normalized to percent (0-100)
    pub confidence: f64,
    /// Severity derived from the confidence
    pub severity: Severity,
    /// Farmer-facing advisory text, or the fallback sentinel
    pub advisory_text: String,
    /// Language the advisory was requested in
    pub language: String,
    /// Creation time (UTC), immutable
    pub created_at: DateTime<Utc>,
}

/// Fields of a detection record about to be persisted. The store assigns the
/// id and timestamp on insert.
#[derive(Debug, Clone)]
pub struct NewDetection {
    pub image_ref: String,
    pub pest_label: String,
    pub confidence: f64,
    pub severity: Severity,
    pub advisory_text: String,
    pub language: String,
}
