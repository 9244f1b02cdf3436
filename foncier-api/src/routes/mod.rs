//! REST API Routes Module
//!
//! Route handlers organized by resource. Registry resources live under
//! `/api` (the path the browser client calls); health, metrics, the OpenAPI
//! document and uploaded files are served from the root.

pub mod document;
pub mod health;
pub mod history;
pub mod note;
pub mod parcel;
pub mod request;
pub mod seed;
pub mod stats;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use foncier_storage::RegistryStore;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
};

use crate::config::ApiConfig;
use crate::documents::DocumentStorage;
use crate::telemetry::{metrics_handler, observability_middleware};

// Re-export route creation functions for convenience
pub use document::create_router as document_router;
pub use health::create_router as health_router;
pub use history::create_router as history_router;
pub use note::create_router as note_router;
pub use parcel::create_router as parcel_router;
pub use request::create_router as request_router;
pub use seed::create_router as seed_router;
pub use stats::create_router as stats_router;

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins any origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(parcel::ACTOR_HEADER),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the registry resource routes, relative to `/api`.
fn build_resource_routes(store: Arc<dyn RegistryStore>, config: &ApiConfig) -> Router {
    let files = DocumentStorage::new(&config.upload_dir);

    Router::new()
        .merge(parcel::create_router(store.clone()))
        .merge(history::create_router(store.clone()))
        .merge(note::create_router(store.clone()))
        .merge(document::create_router(
            store.clone(),
            files,
            config.max_upload_bytes,
        ))
        .merge(request::create_router(store.clone()))
        .merge(stats::create_router(store.clone()))
        .merge(seed::create_router(store, config.seed_enabled))
}

/// Create the complete service router.
///
/// - Registry routes under `/api/*`
/// - Health checks at `/health/*`
/// - Metrics at `/metrics`
/// - Uploaded documents at `/uploads/*`
/// - OpenAPI document at `/openapi.json`, Swagger UI at `/swagger-ui`
///   (with the `openapi` / `swagger-ui` features)
///
/// Layer order (outer to inner): CORS, observability, compression, timeout.
pub fn create_api_router(store: Arc<dyn RegistryStore>, config: &ApiConfig) -> Router {
    let mut router = Router::new()
        .nest("/api", build_resource_routes(store.clone(), config))
        .nest("/health", health::create_router(store))
        .route("/metrics", get(metrics_handler))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir));

    #[cfg(feature = "openapi")]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/openapi/swagger.json", crate::openapi::ApiDoc::openapi()),
        );
    }

    router
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(CompressionLayer::new())
        .layer(from_fn(observability_middleware))
        .layer(build_cors_layer(config))
}
