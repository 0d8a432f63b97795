use crate::handlers::{AppState, detect, get_history, system_status};
use axum::{
    Router,
    routing::{get, post},
};

/// Create the API routes
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        // System status (under the API path)
        .route("/api/status", get(system_status))
        // Pest detection API
        .route("/api/pest/detect", post(detect)) // run one detection cycle
        .route("/api/pest/history", get(get_history)) // detection history, newest first
}
