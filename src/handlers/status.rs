use crate::{handlers::detection::AppState, response::ApiResponse};
use axum::{extract::State, response::Json};

/// Subsystem availability overview
pub async fn system_status(
    State(app_state): State<AppState>,
) -> Json<ApiResponse<serde_json::Value>> {
    let mut status = std::collections::HashMap::new();

    status.insert(
        "database",
        if app_state.database.is_some() {
            "available"
        } else {
            "unavailable"
        },
    );
    status.insert(
        "storage",
        if app_state.storage.is_some() {
            "available"
        } else {
            "unavailable"
        },
    );
    status.insert(
        "detector",
        if app_state.detector.is_some() {
            "available"
        } else {
            "unavailable"
        },
    );
    status.insert(
        "advisory_credential",
        if app_state.config.advisory.api_key.is_some() {
            "configured"
        } else {
            "missing"
        },
    );

    Json(ApiResponse::success(serde_json::json!(status)))
}
