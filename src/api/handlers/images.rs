use crate::AppState;
use crate::api::error::AppError;
use crate::config::{LIST_MAX_RESULTS, LISTING_TAG};
use crate::models::{ImageInfo, ImageListResponse, MessageResponse, SingleImageResponse};
use crate::utils::validation::resolve_public_id;
use axum::{
    Json,
    extract::{Path, State},
};

fn public_id(state: &AppState, id: &str) -> Result<String, AppError> {
    resolve_public_id(&state.config.media_folder, id).ok_or_else(AppError::missing_id)
}

/// Fetch or delete without an id
pub async fn missing_id() -> AppError {
    AppError::missing_id()
}

#[utoipa::path(
    get,
    path = "/api/fetch",
    responses(
        (status = 200, description = "Images carrying the users tag", body = ImageListResponse),
        (status = 400, description = "Media store failure", body = MessageResponse)
    ),
    tag = "images"
)]
pub async fn list_images(State(state): State<AppState>) -> Result<Json<ImageListResponse>, AppError> {
    let images = state
        .media_store
        .list_by_tag(LISTING_TAG, LIST_MAX_RESULTS)
        .await?
        .into_iter()
        .map(|image| ImageInfo::from_stored(&state.config.media_folder, image))
        .collect();

    Ok(Json(ImageListResponse {
        success: true,
        message: "Images successfully fetched".to_string(),
        images,
    }))
}

#[utoipa::path(
    get,
    path = "/api/fetch/{id}",
    params(
        ("id" = String, Path, description = "Image id as returned by an upload")
    ),
    responses(
        (status = 200, description = "The image", body = SingleImageResponse),
        (status = 400, description = "Missing id or media store failure", body = MessageResponse)
    ),
    tag = "images"
)]
pub async fn fetch_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SingleImageResponse>, AppError> {
    let public_id = public_id(&state, &id)?;
    let image = state.media_store.fetch_image(&public_id).await?;

    Ok(Json(SingleImageResponse {
        success: true,
        message: "Image successfully fetched".to_string(),
        image: ImageInfo::from_stored(&state.config.media_folder, image),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/delete",
    responses(
        (status = 200, description = "Every tagged image deleted", body = MessageResponse),
        (status = 400, description = "Media store failure", body = MessageResponse)
    ),
    tag = "images"
)]
pub async fn delete_all_images(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    state.media_store.delete_by_tag(LISTING_TAG).await?;
    tracing::info!("Deleted all images tagged '{}'", LISTING_TAG);

    Ok(Json(MessageResponse::ok("Images successfully deleted")))
}

#[utoipa::path(
    delete,
    path = "/api/delete/{id}",
    params(
        ("id" = String, Path, description = "Image id as returned by an upload")
    ),
    responses(
        (status = 200, description = "Image deleted", body = MessageResponse),
        (status = 400, description = "Missing id or media store failure", body = MessageResponse)
    ),
    tag = "images"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let public_id = public_id(&state, &id)?;
    state
        .media_store
        .delete_images(std::slice::from_ref(&public_id))
        .await?;
    tracing::info!("Deleted image {}", public_id);

    Ok(Json(MessageResponse::ok("Image successfully deleted")))
}
