/*
 * HaritPath - Pest Detection & Advisory Platform
 * Copyright (c) 2026 HaritPath Project
 *
 * This work is licensed under the MIT License
 */

use axum::response::Html;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Query, State},
    http::Method,
    response::Json,
    routing::get,
};
use haritpath_backend::{
    config::Config,
    database::Database,
    docs::ApiDoc,
    error::{AppError, AppResult},
    handlers::AppState,
    image_processing::{ImageProcessingConfig, ImageProcessor},
    repositories::DetectionRepository,
    response::ApiResponse,
    routes::create_api_routes,
    services::{AdvisoryClient, ClassifierClient, DetectionService},
    storage::LocalStorage,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

#[derive(Deserialize)]
struct HealthQuery {
    #[serde(default)]
    detail: bool,
}

/// Health check handler
async fn health_check(Query(params): Query<HealthQuery>) -> Json<ApiResponse<serde_json::Value>> {
    if params.detail {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let mut details = HashMap::new();
        details.insert("status", "healthy");
        details.insert("version", "0.1.0");
        details.insert("timestamp", timestamp.as_str());

        Json(ApiResponse::success(serde_json::json!(details)))
    } else {
        Json(ApiResponse::success(serde_json::json!({"status": "ok"})))
    }
}

/// System information handler
async fn system_info() -> Json<ApiResponse<HashMap<&'static str, serde_json::Value>>> {
    let mut info = HashMap::new();
    info.insert("name", serde_json::json!("HaritPath Backend"));
    info.insert("version", serde_json::json!("0.1.0"));
    info.insert(
        "build_time",
        serde_json::json!(chrono::Utc::now().to_rfc3339()),
    );

    Json(ApiResponse::success(info))
}

/// Database health check handler
async fn db_health_check(
    State(app_state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    match &app_state.database {
        Some(db) => match db.health_check().await {
            Ok(true) => {
                let timestamp = chrono::Utc::now().to_rfc3339();
                Ok(Json(ApiResponse::success(serde_json::json!({
                    "database": "healthy",
                    "timestamp": timestamp,
                }))))
            }
            Ok(false) => Err(AppError::service_unavailable("database is unhealthy")),
            Err(e) => {
                tracing::error!("database health check failed: {}", e);
                Err(AppError::service_unavailable("database health check failed"))
            }
        },
        None => Err(AppError::service_unavailable(
            "database is not configured or failed to connect",
        )),
    }
}

/// Storage health check handler
async fn storage_health_check(
    State(app_state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    match &app_state.storage {
        Some(storage) => match storage.health_check().await {
            Ok(true) => {
                let timestamp = chrono::Utc::now().to_rfc3339();
                Ok(Json(ApiResponse::success(serde_json::json!({
                    "storage": "healthy",
                    "timestamp": timestamp,
                }))))
            }
            _ => Err(AppError::service_unavailable("upload storage is unhealthy")),
        },
        None => Err(AppError::service_unavailable(
            "upload storage is not configured or failed to initialize",
        )),
    }
}

/// Swagger UI page (served at /swagger-ui; OpenAPI JSON at
/// /api-docs/openapi.json)
async fn swagger_ui_page() -> Html<String> {
    let html = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset=UTF-8>
  <title>HaritPath API Documentation</title>
  <link rel=stylesheet href=https://cdn.jsdelivr.net/npm/swagger-ui-dist@5.11.0/swagger-ui.css>
  <style>
    body { margin: 0; font-family: Arial, sans-serif; }
    #swagger-ui { max-width: 100%; }
  </style>
</head>
<body>
  <div id=swagger-ui>
    <div style="padding: 50px; text-align: center;">Loading API documentation...</div>
  </div>
  <script src=https://cdn.jsdelivr.net/npm/swagger-ui-dist@5.11.0/swagger-ui-bundle.js></script>
  <script src=https://cdn.jsdelivr.net/npm/swagger-ui-dist@5.11.0/swagger-ui-standalone-preset.js></script>
  <script>
    window.onload = function() {
      try {
        window.ui = SwaggerUIBundle({
          url: '/api-docs/openapi.json',
          dom_id: '#swagger-ui',
          deepLinking: true,
          presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
          layout: 'StandaloneLayout',
          validatorUrl: null
        });
      } catch (error) {
        console.error('SwaggerUI error:', error);
        document.getElementById('swagger-ui').innerHTML = '<h2>Failed to load API docs</h2><a href="/api-docs/openapi.json">View raw OpenAPI JSON</a>';
      }
    };
  </script>
</body>
</html>"#
        .to_string();
    Html(html)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "haritpath_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (written with defaults on first run)
    let config = Config::load("config.toml");

    tracing::info!("server configuration: {}", config.server_addr());

    // Initialize the database; the service starts degraded when it is down
    let database = match Database::new(&config.database).await {
        Ok(db) => {
            if let Err(e) = db.ensure_schema().await {
                tracing::warn!("schema verification failed: {}", e);
            }
            Some(db)
        }
        Err(e) => {
            tracing::warn!(
                "database connection failed, starting without persistence: {}",
                e
            );
            None
        }
    };

    // Initialize upload storage
    let storage = match LocalStorage::new(&config.upload.dir) {
        Ok(storage) => {
            tracing::info!("upload storage ready at {}", config.upload.dir);
            Some(Arc::new(storage))
        }
        Err(e) => {
            tracing::warn!("upload storage initialization failed: {}", e);
            None
        }
    };

    // Wire the detection service from its injected capabilities
    let detector = match (&database, &storage) {
        (Some(db), Some(storage)) => {
            let classifier = ClassifierClient::new(&config.classifier)?;
            let advisor = AdvisoryClient::new(&config.advisory)?;
            let repository = DetectionRepository::new(db.clone());
            let processor = ImageProcessor::new(ImageProcessingConfig {
                max_image_size: config.upload.max_size,
                ..Default::default()
            });

            Some(Arc::new(DetectionService::new(
                processor,
                storage.clone(),
                Arc::new(classifier),
                Arc::new(advisor),
                Arc::new(repository),
            )))
        }
        _ => {
            tracing::warn!("detection service disabled: missing database or storage");
            None
        }
    };

    let app_state = AppState {
        database,
        storage,
        detector,
        config: config.clone(),
    };

    // CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        // Health checks and system information
        .route("/health", get(health_check))
        .route("/api/system/info", get(system_info))
        .route("/api/health/db", get(db_health_check))
        .route("/api/health/storage", get(storage_health_check))
        // OpenAPI JSON
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Swagger UI page
        .route("/swagger-ui", get(swagger_ui_page))
        .route("/swagger-ui/", get(swagger_ui_page))
        // Business API routes
        .merge(create_api_routes())
        // Read-only static serving of stored images
        .nest_service(
            config.upload.url_prefix.as_str(),
            ServeDir::new(&config.upload.dir),
        )
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.upload.max_size as usize))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("server listening on {}", config.server_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
