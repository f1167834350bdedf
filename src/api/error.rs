use crate::models::MessageResponse;
use crate::services::media_store::MediaStoreError;
use crate::services::upload_pipeline::UploadError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Message returned for any request over the body limit
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "File size too large";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Media store error: {0}")]
    MediaStore(#[from] MediaStoreError),

    #[error("Payload Too Large")]
    PayloadTooLarge,
}

impl AppError {
    pub fn missing_id() -> Self {
        AppError::BadRequest("Please provide an id".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upload(UploadError::FileTooLarge) | AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                PAYLOAD_TOO_LARGE_MESSAGE.to_string(),
            ),
            AppError::Upload(e) => {
                if let Some(source) = std::error::Error::source(&e) {
                    tracing::error!("Upload error: {} ({})", e, source);
                }
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::MediaStore(e) => {
                tracing::error!("Media store error: {:?}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
        };

        (status, Json(MessageResponse::failure(message))).into_response()
    }
}
