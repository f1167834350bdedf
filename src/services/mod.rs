pub mod media_store;
pub mod staging;
pub mod upload_pipeline;
