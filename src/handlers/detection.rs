use crate::{
    config::Config,
    database::Database,
    error::AppError,
    models::DetectionResult,
    services::{DetectionRequest, DetectionService},
    storage::LocalStorage,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub database: Option<Database>,
    pub storage: Option<Arc<LocalStorage>>,
    pub detector: Option<Arc<DetectionService>>,
    pub config: Config,
}

/// Wire envelope of a successful detection
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetectResponse {
    pub success: bool,
    pub result: DetectionResult,
}

/// Wire envelope of a history query
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<DetectionResult>,
}

/// Pest detection handler
///
/// Accepts a multipart form with a required `image` file field and an
/// optional `language` text field, runs the full detection cycle, and
/// returns the persisted record.
#[utoipa::path(
    post,
    path = "/api/pest/detect",
    tag = "pest",
    responses(
        (status = 200, description = "Detection completed and persisted", body = DetectResponse),
        (status = 400, description = "Missing or invalid image payload"),
        (status = 413, description = "Image exceeds the configured size limit"),
        (status = 415, description = "Payload is not a supported image type"),
        (status = 502, description = "Classification service unavailable"),
        (status = 500, description = "Detection result could not be stored")
    )
)]
pub async fn detect(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectResponse>, AppError> {
    let detector = app_state
        .detector
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("pest detection service is not available"))?;

    let max_mb = app_state.config.upload.max_size / 1024 / 1024;
    let mut image_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut language: Option<String> = None;

    // Parse the multipart form
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let error_msg = format!("{}", e);
        if error_msg.contains("body longer than") || error_msg.contains("body is too large") {
            AppError::bad_request(format!(
                "Uploaded image too large, please pick one under {} MB",
                max_mb
            ))
        } else if error_msg.contains("multipart") {
            AppError::bad_request("Upload is not a valid multipart form")
        } else {
            AppError::bad_request(format!("Upload failed: {}", e))
        }
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "image" => {
                filename = field.file_name().map(|s| s.to_string());
                image_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            let error_msg = format!("{}", e);
                            if error_msg.contains("body longer than")
                                || error_msg.contains("body is too large")
                            {
                                AppError::bad_request(format!(
                                    "Uploaded image too large, please pick one under {} MB",
                                    max_mb
                                ))
                            } else {
                                AppError::bad_request(format!("Failed to read image data: {}", e))
                            }
                        })?
                        .to_vec(),
                );
            }
            "language" => {
                language = field
                    .text()
                    .await
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let image_data =
        image_data.ok_or_else(|| AppError::validation("image field is required"))?;
    let filename = filename.unwrap_or_else(|| "capture.jpg".to_string());
    let language = language.unwrap_or_else(|| "English".to_string());

    let result = detector
        .detect(DetectionRequest {
            image: image_data,
            filename,
            language,
        })
        .await?;

    Ok(Json(DetectResponse {
        success: true,
        result,
    }))
}

/// Detection history handler, newest first
#[utoipa::path(
    get,
    path = "/api/pest/history",
    tag = "pest",
    responses(
        (status = 200, description = "All detection records, newest first", body = HistoryResponse),
        (status = 503, description = "Detection service is not available")
    )
)]
pub async fn get_history(
    State(app_state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let detector = app_state
        .detector
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("pest detection service is not available"))?;

    let history = detector.history().await?;

    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}
