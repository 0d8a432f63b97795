use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unified success envelope.
///
/// The payload is flattened next to the `success` flag, so a
/// `HistoryPayload { history }` serializes to
/// `{"success": true, "history": [...]}` on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Create a success response
    pub fn success(payload: T) -> Self {
        Self {
            success: true,
            payload,
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Wire shape of every failed request: `{"success": false, "message": "..."}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        status: String,
    }

    #[test]
    fn test_success_response_flattens_payload() {
        let response = ApiResponse::success(Payload {
            status: "ok".to_string(),
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"success": true, "status": "ok"}));
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse::new("Server error");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"success": false, "message": "Server error"}));
    }
}
