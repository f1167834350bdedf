#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use profile_photo_backend::config::AppConfig;
use profile_photo_backend::models::StoredImage;
use profile_photo_backend::services::media_store::{MediaStore, MediaStoreError, UploadOptions};
use profile_photo_backend::services::staging::StagingArea;
use profile_photo_backend::services::upload_pipeline::UploadPipeline;
use profile_photo_backend::{AppState, create_app};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

struct MockImage {
    url: String,
    tags: Vec<String>,
}

/// In-memory media store. Uploads of files named `reject*` fail.
pub struct MockMediaStore {
    images: Mutex<BTreeMap<String, MockImage>>,
    pub uploads: Mutex<Vec<UploadOptions>>,
    calls: AtomicUsize,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self {
            images: Mutex::new(BTreeMap::new()),
            uploads: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of store operations invoked so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn upload_image(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<StoredImage, MediaStoreError> {
        self.record();
        // The store reads from the staged path, so it must exist now
        let data = tokio::fs::read(path).await?;
        self.uploads.lock().unwrap().push(options.clone());

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        if file_name.starts_with("reject") || data.is_empty() {
            return Err(MediaStoreError::Api {
                status: 400,
                message: "Invalid image file".to_string(),
            });
        }

        let public_id = format!("{}/{}", options.folder, options.public_id);
        let url = format!(
            "https://res.cloudinary.com/demo/image/upload/v1/{}.png",
            public_id
        );
        self.images.lock().unwrap().insert(
            public_id.clone(),
            MockImage {
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
        self.record();
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, image)| image.tags.iter().any(|t| t == tag))
            .take(max_results as usize)
            .map(|(id, image)| StoredImage {
                public_id: id.clone(),
                secure_url: image.url.clone(),
            })
            .collect())
    }

    async fn fetch_image(&self, public_id: &str) -> Result<StoredImage, MediaStoreError> {
        self.record();
        self.images
            .lock()
            .unwrap()
            .get(public_id)
            .map(|image| StoredImage {
                public_id: public_id.to_string(),
                secure_url: image.url.clone(),
            })
            .ok_or_else(|| {
                MediaStoreError::from_body(
                    404,
                    &format!(
                        r#"{{"error":{{"message":"Resource not found - {}"}}}}"#,
                        public_id
                    ),
                )
            })
    }

    async fn delete_by_tag(&self, tag: &str) -> Result<(), MediaStoreError> {
        self.record();
        self.images
            .lock()
            .unwrap()
            .retain(|_, image| !image.tags.iter().any(|t| t == tag));
        Ok(())
    }

    async fn delete_images(&self, public_ids: &[String]) -> Result<(), MediaStoreError> {
        self.record();
        let mut images = self.images.lock().unwrap();
        for id in public_ids {
            images.remove(id);
        }
        Ok(())
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MockMediaStore>,
    pub staging_root: PathBuf,
    _tmp: TempDir,
}

pub fn test_app() -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let staging_root = tmp.path().join("staging");
    let config = AppConfig::local(tmp.path().join("media"), &staging_root);

    let store = Arc::new(MockMediaStore::new());
    let pipeline = Arc::new(UploadPipeline::new(
        store.clone(),
        StagingArea::new(&staging_root),
        config.media_folder.clone(),
    ));

    let state = AppState {
        media_store: store.clone(),
        pipeline,
        config,
    };

    TestApp {
        app: create_app(state),
        store,
        staging_root,
        _tmp: tmp,
    }
}

impl TestApp {
    /// True when nothing is left in (or was ever written to) the staging area
    pub fn staging_is_empty(&self) -> bool {
        match std::fs::read_dir(&self.staging_root) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!(
                "non-JSON body with status {}: {:?}",
                status,
                String::from_utf8_lossy(&body)
            )
        });
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, form: &Form) -> (StatusCode, Value) {
        let (content_type, body) = form.encode();
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

/// Raw multipart/form-data body builder
#[derive(Default)]
pub struct Form {
    parts: Vec<(String, Option<String>, Vec<u8>)>,
}

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts
            .push((name.to_string(), None, value.as_bytes().to_vec()));
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.parts
            .push((name.to_string(), Some(file_name.to_string()), data.to_vec()));
        self
    }

    pub fn encode(&self) -> (String, Vec<u8>) {
        let mut body = Vec::new();
        for (name, file_name, data) in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        (
            format!("multipart/form-data; boundary={}", BOUNDARY),
            body,
        )
    }
}

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake image body";

/// A complete strict-form submission with the given photo filenames
pub fn profile_form(files: &[&str]) -> Form {
    files.iter().fold(
        Form::new()
            .text("name", "Ada Lovelace")
            .text("email", "ada@example.com")
            .text("password", "analytical"),
        |form, file| form.file("profilePhotos", file, PNG),
    )
}
