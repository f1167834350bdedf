pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::media_store::MediaStore;
use crate::services::upload_pipeline::UploadPipeline;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::form::upload_form,
        api::handlers::upload::upload_profile_photos,
        api::handlers::upload::upload_images,
        api::handlers::images::list_images,
        api::handlers::images::fetch_image,
        api::handlers::images::delete_all_images,
        api::handlers::images::delete_image,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::ImageInfo,
            models::ProfileUploadData,
            models::ImageUploadData,
            models::ImageListResponse,
            models::SingleImageResponse,
            models::MessageResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "images", description = "Profile photo upload and management"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub media_store: Arc<dyn MediaStore>,
    pub pipeline: Arc<UploadPipeline>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    use api::handlers::{form, health, images, upload};

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(form::upload_form))
        .route("/api", get(form::upload_form))
        .route("/health", get(health::health_check))
        .route("/upload", post(upload::upload_images))
        .route("/api/upload", post(upload::upload_profile_photos))
        .route("/api/fetch", get(images::list_images))
        .route("/api/fetch/", get(images::missing_id))
        .route("/api/fetch/:id", get(images::fetch_image))
        .route("/api/delete", delete(images::delete_all_images))
        .route("/api/delete/", delete(images::missing_id))
        .route("/api/delete/:id", delete(images::delete_image))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::body_limit::body_limit_middleware,
        ))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
