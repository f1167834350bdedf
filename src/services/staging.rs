use crate::models::FileAttachment;
use crate::utils::validation::staging_filename;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Local directory uploads are written to before being handed to the media store.
///
/// Every staged file gets its own subdirectory, so attachments with the same
/// filename never overwrite each other.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

/// A file written to the staging area. Consumed by [`StagedFile::discard`].
#[derive(Debug)]
pub struct StagedFile {
    dir: PathBuf,
    path: PathBuf,
    file_name: String,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn stage(&self, attachment: &FileAttachment) -> io::Result<StagedFile> {
        let file_name = staging_filename(attachment.file_name.as_deref());
        let dir = self.root.join(Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(&file_name);
        if let Err(e) = tokio::fs::write(&path, &attachment.data).await {
            let _ = tokio::fs::remove_dir_all(&dir).await;
            return Err(e);
        }

        tracing::debug!(
            "Staged {} ({} bytes) at {}",
            file_name,
            attachment.data.len(),
            path.display()
        );

        Ok(StagedFile {
            dir,
            path,
            file_name,
        })
    }
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Removes the staged copy and its directory
    pub async fn discard(self) -> io::Result<()> {
        tokio::fs::remove_dir_all(&self.dir).await
    }
}
