use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Maximum accepted request body (and therefore file) size: 5 MiB
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Upper bound on images returned by a tag listing
pub const LIST_MAX_RESULTS: u32 = 100;

/// Tags attached to every stored image
pub const IMAGE_TAGS: &[&str] = &["users", "images"];

/// Tag used for listing and bulk deletion
pub const LISTING_TAG: &str = "users";

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("unknown MEDIA_BACKEND '{0}' (expected 'cloudinary' or 'local')")]
    UnknownBackend(String),

    #[error("unknown CLOUDINARY_SIGNATURE_ALGORITHM '{0}' (expected 'sha1' or 'sha256')")]
    UnknownSignatureAlgorithm(String),

    #[error("{name} must be a positive integer, got '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Digest used to sign upload requests; must match the account setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            _ => Err(ConfigError::UnknownSignatureAlgorithm(value.to_string())),
        }
    }
}

/// Credentials for the Cloudinary upload and admin APIs
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// API root without the cloud name (default: "https://api.cloudinary.com/v1_1")
    pub api_base: String,
    pub signature_algorithm: SignatureAlgorithm,
}

impl fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum MediaBackend {
    Cloudinary(CloudinaryCredentials),
    /// Images are kept on local disk only
    Local { root: PathBuf },
}

impl MediaBackend {
    pub fn name(&self) -> &'static str {
        match self {
            MediaBackend::Cloudinary(_) => "cloudinary",
            MediaBackend::Local { .. } => "local",
        }
    }
}

/// Runtime configuration resolved once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub media_backend: MediaBackend,

    /// Directory uploaded files are staged in before being handed to the store
    pub staging_dir: PathBuf,

    /// Folder images are stored under; also the prefix of every public id (default: "profilePhotos")
    pub media_folder: String,

    /// Maximum request body size in bytes (default: 5 MiB)
    pub max_upload_size: usize,

    /// Timeout for a single call to the media store (default: 30)
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Fails when the selected backend is missing required settings, so a
    /// misconfigured process never starts serving.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let media_backend = match var("MEDIA_BACKEND")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            None | Some("cloudinary") => MediaBackend::Cloudinary(CloudinaryCredentials {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                api_base: var("CLOUDINARY_API_BASE")
                    .map(|v| v.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                signature_algorithm: var("CLOUDINARY_SIGNATURE_ALGORITHM")
                    .map(|v| SignatureAlgorithm::parse(&v))
                    .transpose()?
                    .unwrap_or_default(),
            }),
            Some("local") => MediaBackend::Local {
                root: var("LOCAL_MEDIA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("media")),
            },
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let request_timeout_secs = match var("MEDIA_REQUEST_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    name: "MEDIA_REQUEST_TIMEOUT_SECS",
                    value,
                })?,
            None => 30,
        };

        Ok(Self {
            media_backend,
            staging_dir: var("UPLOAD_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("profile-photo-staging")),
            media_folder: var("MEDIA_FOLDER").unwrap_or_else(|| "profilePhotos".to_string()),
            max_upload_size: MAX_UPLOAD_SIZE,
            request_timeout_secs,
        })
    }

    /// Config for tests and local development: local backend rooted at `root`
    pub fn local(root: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_backend: MediaBackend::Local { root: root.into() },
            staging_dir: staging_dir.into(),
            media_folder: "profilePhotos".to_string(),
            max_upload_size: MAX_UPLOAD_SIZE,
            request_timeout_secs: 30,
        }
    }
}
