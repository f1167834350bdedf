use super::{MediaStore, MediaStoreError, UploadOptions};
use crate::config::{CloudinaryCredentials, SignatureAlgorithm};
use crate::models::StoredImage;
use crate::utils::validation::has_dot_segment;
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

/// Characters escaped inside a single URL path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<StoredImage>,
}

/// Cloudinary upload API (signed) plus the admin API for listing and deletion
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    credentials: CloudinaryCredentials,
}

impl CloudinaryMediaStore {
    pub fn new(
        credentials: CloudinaryCredentials,
        timeout: Duration,
    ) -> Result<Self, MediaStoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.credentials.api_base, self.credentials.cloud_name, path
        )
    }

    /// Upload parameters covered by the request signature
    fn signed_params(options: &UploadOptions, timestamp: i64) -> Vec<(&'static str, String)> {
        vec![
            ("folder", options.folder.clone()),
            ("public_id", options.public_id.clone()),
            ("tags", options.tags.join(",")),
            ("timestamp", timestamp.to_string()),
        ]
    }

    /// Signs `params` the way the upload API expects: non-empty params sorted
    /// by name, joined as `k=v&k=v`, the secret appended, then hex digested.
    pub fn sign(
        params: &[(&str, String)],
        api_secret: &str,
        algorithm: SignatureAlgorithm,
    ) -> String {
        let mut sorted: Vec<&(&str, String)> =
            params.iter().filter(|(_, v)| !v.is_empty()).collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let payload = format!("{}{}", to_sign, api_secret);

        match algorithm {
            SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
            SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
        }
    }

    /// Escapes each segment of a public id, keeping the folder separators
    fn encode_public_id(public_id: &str) -> String {
        public_id
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Admin API path of an uploaded image. Dot segments would be normalized
    /// out of the URL and reach other endpoints, so they never name an image.
    fn resource_path(public_id: &str) -> Result<String, MediaStoreError> {
        if has_dot_segment(public_id) {
            return Err(MediaStoreError::NotFound {
                public_id: public_id.to_string(),
            });
        }
        Ok(format!(
            "resources/image/upload/{}",
            Self::encode_public_id(public_id)
        ))
    }

    fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .basic_auth(
                &self.credentials.api_key,
                Some(&self.credentials.api_secret),
            )
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MediaStoreError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MediaStoreError::from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| MediaStoreError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload_image(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<StoredImage, MediaStoreError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let params = Self::signed_params(options, chrono::Utc::now().timestamp());
        let signature = Self::sign(
            &params,
            &self.credentials.api_secret,
            self.credentials.signature_algorithm,
        );

        let mut part = Part::bytes(data).file_name(file_name);
        if let Some(content_type) = options.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let mut form = Form::new().part("file", part);
        for (key, value) in params {
            form = form.text(key, value);
        }
        let form = form
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await?;

        let image: StoredImage = Self::read_json(response).await?;
        tracing::debug!("Stored image {} at {}", image.public_id, image.secure_url);
        Ok(image)
    }

    async fn list_by_tag(
        &self,
        tag: &str,
        max_results: u32,
    ) -> Result<Vec<StoredImage>, MediaStoreError> {
        let path = format!(
            "resources/image/tags/{}",
            utf8_percent_encode(tag, SEGMENT)
        );
        let response = self
            .admin(reqwest::Method::GET, &path)
            .query(&[("max_results", max_results.to_string())])
            .send()
            .await?;

        let list: ResourceList = Self::read_json(response).await?;
        Ok(list.resources)
    }

    async fn fetch_image(&self, public_id: &str) -> Result<StoredImage, MediaStoreError> {
        let path = Self::resource_path(public_id)?;
        let response = self.admin(reqwest::Method::GET, &path).send().await?;
        Self::read_json(response).await
    }

    async fn delete_by_tag(&self, tag: &str) -> Result<(), MediaStoreError> {
        let path = format!(
            "resources/image/tags/{}",
            utf8_percent_encode(tag, SEGMENT)
        );
        let response = self.admin(reqwest::Method::DELETE, &path).send().await?;
        let _: serde_json::Value = Self::read_json(response).await?;
        Ok(())
    }

    async fn delete_images(&self, public_ids: &[String]) -> Result<(), MediaStoreError> {
        if public_ids.is_empty() {
            return Ok(());
        }

        let query: Vec<(&str, &str)> = public_ids
            .iter()
            .map(|id| ("public_ids[]", id.as_str()))
            .collect();
        let response = self
            .admin(reqwest::Method::DELETE, "resources/image/upload")
            .query(&query)
            .send()
            .await?;
        let _: serde_json::Value = Self::read_json(response).await?;
        Ok(())
    }

    async fn ping(&self) -> bool {
        match self.admin(reqwest::Method::GET, "ping").send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Cloudinary ping failed: {}", e);
                false
            }
        }
    }
}
