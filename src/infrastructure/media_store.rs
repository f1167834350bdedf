use crate::config::{AppConfig, MediaBackend};
use crate::services::media_store::{CloudinaryMediaStore, LocalMediaStore, MediaStore};
use crate::services::staging::StagingArea;
use crate::services::upload_pipeline::UploadPipeline;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn setup_media_store(config: &AppConfig) -> anyhow::Result<Arc<dyn MediaStore>> {
    match &config.media_backend {
        MediaBackend::Cloudinary(credentials) => {
            info!(
                "☁️  Media store: Cloudinary (cloud: {}, folder: {})",
                credentials.cloud_name, config.media_folder
            );
            let store = CloudinaryMediaStore::new(
                credentials.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;

            // Warm up the connection; credentials problems show up here first
            if store.ping().await {
                info!("✅ Cloudinary is reachable");
            } else {
                warn!("⚠️  Cloudinary ping failed! Uploads will fail until it is reachable.");
            }

            Ok(Arc::new(store))
        }
        MediaBackend::Local { root } => {
            info!("📁 Media store: local disk at {}", root.display());
            Ok(Arc::new(LocalMediaStore::open(root).await?))
        }
    }
}

pub async fn setup_pipeline(
    config: &AppConfig,
    store: Arc<dyn MediaStore>,
) -> anyhow::Result<Arc<UploadPipeline>> {
    tokio::fs::create_dir_all(&config.staging_dir).await?;
    info!("📦 Staging uploads in {}", config.staging_dir.display());

    Ok(Arc::new(UploadPipeline::new(
        store,
        StagingArea::new(&config.staging_dir),
        config.media_folder.clone(),
    )))
}
