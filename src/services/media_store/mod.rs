use crate::models::StoredImage;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Failure of a media store call, normalized from whatever shape the store reported
#[derive(Debug, Error)]
pub enum MediaStoreError {
    /// The store answered with an error status
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Resource not found - {public_id}")]
    NotFound { public_id: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected response from media store: {0}")]
    InvalidResponse(String),
}

impl MediaStoreError {
    /// Builds an `Api` error from an error response body.
    ///
    /// The message may be at the top level (`{"message": ..}`) or nested
    /// (`{"error": {"message": ..}}`, `{"error": ".."}`).
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| {
                v.get("message")
                    .and_then(Value::as_str)
                    .or_else(|| v.pointer("/error/message").and_then(Value::as_str))
                    .or_else(|| v.get("error").and_then(Value::as_str))
            })
            .map(str::to_string)
            .unwrap_or_else(|| {
                let text = body.trim();
                if text.is_empty() || parsed.is_some() {
                    format!("Media store responded with status {}", status)
                } else {
                    text.to_string()
                }
            });

        MediaStoreError::Api { status, message }
    }
}

/// Where and how an image is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    /// Id relative to `folder`
    pub public_id: String,
    pub tags: Vec<String>,
    /// Media type the client declared for the file, if any
    pub content_type: Option<String>,
}

/// Image hosting backend. All operations act on image resources only.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Backend identifier (e.g., "cloudinary", "local")
    fn name(&self) -> &'static str;

    /// Store the file at `path` as an image
    async fn upload_image(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<StoredImage, MediaStoreError>;

    /// Up to `max_results` images carrying `tag`
    async fn list_by_tag(
        &self,
        tag: &str,
        max_results: u32,
    ) -> Result<Vec<StoredImage>, MediaStoreError>;

    /// One image by its full public id (folder included)
    async fn fetch_image(&self, public_id: &str) -> Result<StoredImage, MediaStoreError>;

    /// Delete every image carrying `tag`. Succeeds when nothing carries it.
    async fn delete_by_tag(&self, tag: &str) -> Result<(), MediaStoreError>;

    /// Delete images by full public id
    async fn delete_images(&self, public_ids: &[String]) -> Result<(), MediaStoreError>;

    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> bool {
        true
    }
}

pub mod cloudinary;
pub mod local;

pub use cloudinary::CloudinaryMediaStore;
pub use local::LocalMediaStore;

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: MediaStoreError) -> String {
        match err {
            MediaStoreError::Api { message, .. } => message,
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_top_level_message() {
        let err = MediaStoreError::from_body(400, r#"{"message":"Invalid image file"}"#);
        assert_eq!(message(err), "Invalid image file");
    }

    #[test]
    fn test_nested_error_message() {
        let err = MediaStoreError::from_body(
            404,
            r#"{"error":{"message":"Resource not found - profilePhotos/abc"}}"#,
        );
        assert_eq!(message(err), "Resource not found - profilePhotos/abc");

        let err = MediaStoreError::from_body(401, r#"{"error":"Invalid Signature"}"#);
        assert_eq!(message(err), "Invalid Signature");
    }

    #[test]
    fn test_unrecognized_bodies() {
        let err = MediaStoreError::from_body(502, "");
        assert_eq!(message(err), "Media store responded with status 502");

        let err = MediaStoreError::from_body(500, r#"{"unexpected":true}"#);
        assert_eq!(message(err), "Media store responded with status 500");

        let err = MediaStoreError::from_body(503, "Service Unavailable");
        assert_eq!(message(err), "Service Unavailable");
    }
}
