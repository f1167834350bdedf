use crate::config::MAX_UPLOAD_SIZE;
use crate::utils::validation::external_id;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Per-file byte bound, in the integer type length validation compares with
const MAX_FILE_BYTES: u64 = MAX_UPLOAD_SIZE as u64;

/// One file part of a multipart submission
#[derive(Debug, Clone, Validate)]
pub struct FileAttachment {
    /// Filename as sent by the client
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    #[validate(length(max = MAX_FILE_BYTES, message = "File size too large"))]
    pub data: Vec<u8>,
}

impl FileAttachment {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content_type: None,
            data: data.into(),
        }
    }
}

/// A parsed upload form. Text fields are `None` when absent from the form.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Number of text fields present in the form, recognised or not
    pub field_count: usize,
    /// Always a sequence, even for a single file part
    pub files: Vec<FileAttachment>,
}

/// An image as the media store reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredImage {
    pub public_id: String,
    pub secure_url: String,
}

/// External projection of a stored image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImageInfo {
    pub id: String,
    pub url: String,
}

impl ImageInfo {
    /// Projects a stored image, reporting its id relative to `folder`
    pub fn from_stored(folder: &str, image: StoredImage) -> Self {
        Self {
            id: external_id(folder, &image.public_id),
            url: image.secure_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileUploadData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub images: Vec<ImageInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUploadData {
    pub name: String,
    pub email: String,
    pub uploads: Vec<ImageInfo>,
}

/// Envelope of a successful upload; `data` is one of the `*UploadData` shapes
#[derive(Debug, Serialize)]
pub struct UploadResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageListResponse {
    pub success: bool,
    pub message: String,
    pub images: Vec<ImageInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SingleImageResponse {
    pub success: bool,
    pub message: String,
    pub image: ImageInfo,
}

/// Body of every plain success and every failure response
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
