use super::DetectionStore;
use crate::{
    database::Database,
    error::AppResult,
    models::{DetectionResult, NewDetection},
};
use uuid::Uuid;

/// Postgres-backed detection record repository
#[derive(Debug, Clone)]
pub struct DetectionRepository {
    db: Database,
}

impl DetectionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl DetectionStore for DetectionRepository {
    async fn save(&self, detection: NewDetection) -> AppResult<DetectionResult> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let result = sqlx::query_as::<_, DetectionResult>(
            r#"
            INSERT INTO detection_results (
                id, image_ref, pest_label, confidence, severity,
                advisory_text, language, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, image_ref, pest_label, confidence, severity,
                advisory_text, language, created_at
            "#,
        )
        .bind(id)
        .bind(detection.image_ref)
        .bind(detection.pest_label)
        .bind(detection.confidence)
        .bind(detection.severity)
        .bind(detection.advisory_text)
        .bind(detection.language)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        Ok(result)
    }

    async fn list_all(&self) -> AppResult<Vec<DetectionResult>> {
        // id breaks ties between records created in the same microsecond so
        // the ordering stays deterministic
        let results = sqlx::query_as::<_, DetectionResult>(
            r#"
            SELECT
                id, image_ref, pest_label, confidence, severity,
                advisory_text, language, created_at
            FROM detection_results
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(results)
    }
}
