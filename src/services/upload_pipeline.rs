use crate::config::IMAGE_TAGS;
use crate::models::{FileAttachment, ImageInfo, UploadRequest};
use crate::services::media_store::{MediaStore, MediaStoreError, UploadOptions};
use crate::services::staging::StagingArea;
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Which text fields an upload form must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// `name`, `email` and `password`
    Strict,
    /// `name` and `email`
    Relaxed,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No fields were provided")]
    NoFields,

    #[error("Please provide all the details")]
    MissingDetails,

    #[error("No files were uploaded")]
    NoFiles,

    #[error("File size too large")]
    FileTooLarge,

    #[error("Error uploading file to the local server")]
    Staging(#[source] std::io::Error),

    #[error("Error uploading file to the media store")]
    Store(#[source] MediaStoreError),
}

/// Text fields that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    pub name: String,
    pub email: String,
    /// Only set under [`FieldPolicy::Strict`]
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub fields: ValidatedFields,
    /// One entry per attachment, in submission order
    pub images: Vec<ImageInfo>,
}

/// Stages each attachment, stores it, and reports the batch as a whole
pub struct UploadPipeline {
    store: Arc<dyn MediaStore>,
    staging: StagingArea,
    folder: String,
    tags: Vec<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn MediaStore>, staging: StagingArea, folder: impl Into<String>) -> Self {
        Self {
            store,
            staging,
            folder: folder.into(),
            tags: IMAGE_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Checks the request without touching disk or network
    pub fn validate(
        request: &UploadRequest,
        policy: FieldPolicy,
    ) -> Result<ValidatedFields, UploadError> {
        if request.field_count == 0 {
            return Err(UploadError::NoFields);
        }

        let name = present(&request.name).ok_or(UploadError::MissingDetails)?;
        let email = present(&request.email).ok_or(UploadError::MissingDetails)?;
        let password = match policy {
            FieldPolicy::Strict => Some(present(&request.password).ok_or(UploadError::MissingDetails)?),
            FieldPolicy::Relaxed => None,
        };

        if request.files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        if request.files.iter().any(|file| file.validate().is_err()) {
            return Err(UploadError::FileTooLarge);
        }

        Ok(ValidatedFields {
            name,
            email,
            password,
        })
    }

    /// Uploads every attachment concurrently.
    ///
    /// All per-file operations run to completion; if any of them failed the
    /// batch fails with that error. Images already stored by the other
    /// attachments are left in place.
    pub async fn run(
        &self,
        request: UploadRequest,
        policy: FieldPolicy,
    ) -> Result<UploadOutcome, UploadError> {
        let fields = Self::validate(&request, policy)?;
        info!(
            "Uploading {} file(s) to {} for {}",
            request.files.len(),
            self.store.name(),
            fields.email
        );

        let results = join_all(request.files.iter().map(|file| self.process(file))).await;
        let images = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        info!("Stored {} image(s) for {}", images.len(), fields.email);
        Ok(UploadOutcome { fields, images })
    }

    async fn process(&self, attachment: &FileAttachment) -> Result<ImageInfo, UploadError> {
        let staged = self.staging.stage(attachment).await.map_err(|e| {
            error!("Staging write failed: {}", e);
            UploadError::Staging(e)
        })?;

        let options = UploadOptions {
            folder: self.folder.clone(),
            public_id: Uuid::now_v7().simple().to_string(),
            tags: self.tags.clone(),
            content_type: attachment.content_type.clone(),
        };
        let stored = self.store.upload_image(staged.path(), &options).await;

        let file_name = staged.file_name().to_string();
        if let Err(e) = staged.discard().await {
            warn!("Failed to remove staged file {}: {}", file_name, e);
        }

        let image = stored.map_err(|e| {
            error!("Media store rejected {}: {}", file_name, e);
            UploadError::Store(e)
        })?;

        Ok(ImageInfo::from_stored(&self.folder, image))
    }
}
