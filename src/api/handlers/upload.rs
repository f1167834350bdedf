use crate::AppState;
use crate::api::error::AppError;
use crate::models::{
    FileAttachment, ImageUploadData, MessageResponse, ProfileUploadData, UploadRequest,
    UploadResponse,
};
use crate::services::upload_pipeline::{FieldPolicy, UploadError};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

/// File field of the strict upload form
pub const PROFILE_PHOTOS_FIELD: &str = "profilePhotos";

/// File field of the relaxed upload form
pub const PROFILE_IMAGE_FIELD: &str = "profileImage";

const UPLOADED_MESSAGE: &str = "Images successfully uploaded";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// A body that is not `multipart/form-data` carries no form fields
fn multipart_rejection(rejection: MultipartRejection) -> AppError {
    match rejection {
        MultipartRejection::InvalidBoundary(_) => AppError::Upload(UploadError::NoFields),
        other => AppError::BadRequest(other.body_text()),
    }
}

/// Collects the form into an [`UploadRequest`].
///
/// Parts carrying a filename are files; only those named `file_field` are
/// kept, however many there are. Everything else is a text field.
pub async fn read_upload_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<UploadRequest, AppError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;

            // Browsers send an empty part when no file was picked
            if file_name.is_empty() && data.is_empty() {
                continue;
            }
            if name != file_field {
                tracing::debug!("Ignoring file part '{}' ({})", name, file_name);
                continue;
            }

            request.files.push(FileAttachment {
                file_name: Some(file_name),
                content_type,
                data: data.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            request.field_count += 1;
            match name.as_str() {
                "name" => request.name = Some(value),
                "email" => request.email = Some(value),
                "password" => request.password = Some(value),
                _ => {}
            }
        }
    }

    Ok(request)
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = Object, description = "Fields `name`, `email`, `password` and one or more `profilePhotos` files", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Images uploaded; `data` holds the echoed fields and images", body = ProfileUploadData),
        (status = 400, description = "Validation or upload failure", body = MessageResponse),
        (status = 413, description = "Request too large", body = MessageResponse)
    ),
    tag = "images"
)]
pub async fn upload_profile_photos(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse<ProfileUploadData>>, AppError> {
    let multipart = multipart.map_err(multipart_rejection)?;
    let request = read_upload_form(multipart, PROFILE_PHOTOS_FIELD).await?;
    let outcome = state.pipeline.run(request, FieldPolicy::Strict).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: UPLOADED_MESSAGE.to_string(),
        data: ProfileUploadData {
            name: outcome.fields.name,
            email: outcome.fields.email,
            password: outcome.fields.password.unwrap_or_default(),
            images: outcome.images,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Object, description = "Fields `name`, `email` and one or more `profileImage` files", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Images uploaded; `data` holds the echoed fields and uploads", body = ImageUploadData),
        (status = 400, description = "Validation or upload failure", body = MessageResponse),
        (status = 413, description = "Request too large", body = MessageResponse)
    ),
    tag = "images"
)]
pub async fn upload_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse<ImageUploadData>>, AppError> {
    let multipart = multipart.map_err(multipart_rejection)?;
    let request = read_upload_form(multipart, PROFILE_IMAGE_FIELD).await?;
    let outcome = state.pipeline.run(request, FieldPolicy::Relaxed).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: UPLOADED_MESSAGE.to_string(),
        data: ImageUploadData {
            name: outcome.fields.name,
            email: outcome.fields.email,
            uploads: outcome.images,
        },
    }))
}
