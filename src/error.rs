use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response::ErrorResponse;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("classification failed: {0}")]
    Classification(String),

    #[error("advisory generation failed: {0}")]
    Advisory(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("file too large: maximum allowed size is {max_size} bytes")]
    FileTooLarge { max_size: u64 },

    #[error("unsupported file type: {file_type}")]
    UnsupportedFileType { file_type: String },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Data serialization error".to_string(),
            ),
            AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "File IO error".to_string(),
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // The classifier's internals are never exposed to the caller.
            AppError::Classification(_) => (
                StatusCode::BAD_GATEWAY,
                "Pest detection service unavailable".to_string(),
            ),
            AppError::Advisory(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error generating advisory".to_string(),
            ),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store detection result".to_string(),
            ),
            AppError::FileTooLarge { max_size } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Image too large, maximum allowed size: {} MB",
                    max_size / 1024 / 1024
                ),
            ),
            AppError::UnsupportedFileType { file_type } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported image type: {}", file_type),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound { resource } => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", resource))
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        };

        tracing::error!("application error: {}", self);

        (status, axum::Json(ErrorResponse::new(message))).into_response()
    }
}

/// Application Result alias
pub type AppResult<T> = Result<T, AppError>;

/// Error construction helpers
impl AppError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn classification<T: Into<String>>(msg: T) -> Self {
        Self::Classification(msg.into())
    }

    pub fn advisory<T: Into<String>>(msg: T) -> Self {
        Self::Advisory(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn file_too_large(max_size: u64) -> Self {
        Self::FileTooLarge { max_size }
    }

    pub fn unsupported_file_type<T: Into<String>>(file_type: T) -> Self {
        Self::UnsupportedFileType {
            file_type: file_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AppError::validation("missing image payload");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "validation error: missing image payload");
    }

    #[test]
    fn test_file_too_large_error() {
        let err = AppError::file_too_large(10 * 1024 * 1024); // 10MB
        assert!(matches!(err, AppError::FileTooLarge { .. }));
    }

    #[test]
    fn test_classification_error_hides_details() {
        // Internal classifier errors carry details for the log only.
        let err = AppError::classification("connection refused to 10.0.0.3:8000");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_not_found_error() {
        let err = AppError::not_found("detection result");
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
