pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServiceConfig;
use crate::services::raster_service::RasterService;
use axum::{
    Router,
    middleware::from_fn,
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::rasters::upload::upload_form,
        api::handlers::rasters::upload::upload_raster,
        api::handlers::rasters::metadata::raster_metadata,
        api::handlers::rasters::data::raster_data,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::rasters::UploadResponse,
            api::handlers::rasters::UploadForm,
            api::handlers::rasters::ErrorResponse,
            api::handlers::health::HealthResponse,
            models::RasterMetadata,
        )
    ),
    tags(
        (name = "rasters", description = "Raster upload, metadata and data endpoints"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub raster_service: Arc<RasterService>,
    pub config: ServiceConfig,
}

/// Upload, metadata and data routes are served under both `/uploads` and `/rasters`.
const RASTER_PREFIXES: [&str; 2] = ["/uploads", "/rasters"];

pub fn create_app(state: AppState) -> Router {
    let upload = get(api::handlers::rasters::upload_form)
        .post(api::handlers::rasters::upload_raster);

    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/", upload.clone())
        .route("/rasters", upload.clone())
        .route("/rasters/", upload);

    for prefix in RASTER_PREFIXES {
        router = router
            .route(
                &format!("{}/:id", prefix),
                get(api::handlers::rasters::raster_metadata),
            )
            .route(
                &format!("{}/:id/data", prefix),
                get(api::handlers::rasters::raster_data),
            )
            .route(
                &format!("{}/:id/data/:width/:height", prefix),
                get(api::handlers::rasters::raster_data),
            )
            .route(
                &format!("{}/:id/data/:width/:height/:method", prefix),
                get(api::handlers::rasters::raster_data),
            );
    }

    router
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 1024 * 1024, // 1MB buffer for multipart overhead
        ))
        .with_state(state)
}
