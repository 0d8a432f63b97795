use crate::{
    handlers::{DetectResponse, HistoryResponse},
    models::{DetectionResult, Severity},
    response::ErrorResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::detection::detect,
        crate::handlers::detection::get_history,
    ),
    components(schemas(
        DetectionResult,
        Severity,
        DetectResponse,
        HistoryResponse,
        ErrorResponse,
    )),
    tags(
        (name = "pest", description = "Pest detection and advisory history")
    ),
    info(
        title = "HaritPath Backend API",
        description = "Pest detection and advisory backend for small farmers",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/api/pest/detect"));
        assert!(json.contains("/api/pest/history"));
    }
}
