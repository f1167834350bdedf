use super::{MediaStore, MediaStoreError, UploadOptions};
use crate::models::StoredImage;
use crate::utils::validation::extension_of;
use async_trait::async_trait;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

struct LocalImage {
    path: PathBuf,
    url: String,
    tags: Vec<String>,
}

/// Keeps images on local disk under `root/<folder>/<id>.<ext>`.
///
/// The tag index lives in memory, so images stored by a previous process are
/// not listed or deleted by tag.
pub struct LocalMediaStore {
    root: PathBuf,
    index: DashMap<String, LocalImage>,
}

impl LocalMediaStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, MediaStoreError> {
        tokio::fs::create_dir_all(root.as_ref()).await?;
        let root = tokio::fs::canonicalize(root.as_ref()).await?;
        Ok(Self {
            root,
            index: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn remove_file(path: &Path) -> Result<(), MediaStoreError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn upload_image(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<StoredImage, MediaStoreError> {
        let public_id = format!("{}/{}", options.folder, options.public_id);
        let extension = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(extension_of)
            .unwrap_or_default();

        let destination = self
            .root
            .join(&options.folder)
            .join(format!("{}{}", options.public_id, extension));
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(path, &destination).await?;

        let url = Url::from_file_path(&destination)
            .map_err(|_| {
                MediaStoreError::InvalidResponse(format!(
                    "cannot build URL for {}",
                    destination.display()
                ))
            })?
            .to_string();

        self.index.insert(
            public_id.clone(),
            LocalImage {
                path: destination,
                url: url.clone(),
                tags: options.tags.clone(),
            },
        );

        Ok(StoredImage {
            public_id,
            secure_url: url,
        })
    }

    async fn list_by_tag(
        &self,
        tag: &str,
        max_results: u32,
    ) -> Result<Vec<StoredImage>, MediaStoreError> {
        let mut images: Vec<StoredImage> = self
            .index
            .iter()
            .filter(|entry| entry.tags.iter().any(|t| t == tag))
            .map(|entry| StoredImage {
                public_id: entry.key().clone(),
                secure_url: entry.url.clone(),
            })
            .collect();

        images.sort_by(|a, b| a.public_id.cmp(&b.public_id));
        images.truncate(max_results as usize);
        Ok(images)
    }

    async fn fetch_image(&self, public_id: &str) -> Result<StoredImage, MediaStoreError> {
        self.index
            .get(public_id)
            .map(|entry| StoredImage {
                public_id: public_id.to_string(),
                secure_url: entry.url.clone(),
            })
            .ok_or_else(|| MediaStoreError::NotFound {
                public_id: public_id.to_string(),
            })
    }

    async fn delete_by_tag(&self, tag: &str) -> Result<(), MediaStoreError> {
        let tagged: Vec<String> = self
            .index
            .iter()
            .filter(|entry| entry.tags.iter().any(|t| t == tag))
            .map(|entry| entry.key().clone())
            .collect();

        self.delete_images(&tagged).await
    }

    async fn delete_images(&self, public_ids: &[String]) -> Result<(), MediaStoreError> {
        for public_id in public_ids {
            if let Some((_, image)) = self.index.remove(public_id) {
                Self::remove_file(&image.path).await?;
            }
        }
        Ok(())
    }

    async fn ping(&self) -> bool {
        tokio::fs::metadata(&self.root).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(id: &str, tags: &[&str]) -> UploadOptions {
        UploadOptions {
            folder: "profilePhotos".to_string(),
            public_id: id.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            content_type: None,
        }
    }

    async fn staged(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, b"\x89PNG fake").await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_and_fetch() {
        let media = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::open(media.path()).await.unwrap();

        let source = staged(staging.path(), "cat.PNG").await;
        let image = store
            .upload_image(&source, &options("001", &["users", "images"]))
            .await
            .unwrap();

        assert_eq!(image.public_id, "profilePhotos/001");
        assert!(image.secure_url.starts_with("file://"));
        assert!(image.secure_url.ends_with("/profilePhotos/001.png"));
        assert!(store.root().join("profilePhotos/001.png").exists());

        let fetched = store.fetch_image("profilePhotos/001").await.unwrap();
        assert_eq!(fetched, image);
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let media = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::open(media.path()).await.unwrap();

        let err = store.fetch_image("profilePhotos/nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Resource not found - profilePhotos/nope");
    }

    #[tokio::test]
    async fn test_tag_listing_and_deletion() {
        let media = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::open(media.path()).await.unwrap();

        for (id, tags) in [("a", &["users"][..]), ("b", &["users"][..]), ("c", &["other"][..])] {
            let source = staged(staging.path(), &format!("{}.jpg", id)).await;
            store.upload_image(&source, &options(id, tags)).await.unwrap();
        }

        let listed = store.list_by_tag("users", 100).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|i| i.public_id.as_str()).collect();
        assert_eq!(ids, vec!["profilePhotos/a", "profilePhotos/b"]);
        assert_eq!(store.list_by_tag("users", 1).await.unwrap().len(), 1);

        store.delete_by_tag("users").await.unwrap();
        assert!(store.list_by_tag("users", 100).await.unwrap().is_empty());
        assert!(!store.root().join("profilePhotos/a.jpg").exists());
        assert!(store.fetch_image("profilePhotos/c").await.is_ok());

        // Nothing left to delete
        store.delete_by_tag("users").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_single_image() {
        let media = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::open(media.path()).await.unwrap();

        let source = staged(staging.path(), "d.gif").await;
        store.upload_image(&source, &options("d", &["users"])).await.unwrap();

        store
            .delete_images(&["profilePhotos/d".to_string()])
            .await
            .unwrap();
        assert!(store.fetch_image("profilePhotos/d").await.is_err());

        // Unknown ids are ignored
        store
            .delete_images(&["profilePhotos/unknown".to_string()])
            .await
            .unwrap();
    }
}
