//! post-receiver - Receives generated sport post images and catalogs them
//!
//! This crate provides:
//! - Ingestion of images sent as multipart files, base64/data URLs or remote URLs
//! - Local-disk storage of the images, served back under `/uploads`
//! - An in-memory, insertion-ordered catalog of posts queryable by id or sport
//! - A client-side composer that draws text onto a template and uploads it

pub mod api;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod ingest;
pub mod uploads;

use std::sync::Arc;

use catalog::Catalog;
use config::Config;
use ingest::Ingestor;
use uploads::{LocalUploads, UploadStore};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
    pub ingestor: Ingestor,
    pub uploads: Arc<dyn UploadStore>,
}

impl AppState {
    /// Wire up the local uploads directory, an empty catalog and the HTTP
    /// client used for remote image fetches.
    pub fn from_config(config: Config) -> anyhow::Result<Arc<Self>> {
        let uploads: Arc<dyn UploadStore> =
            Arc::new(LocalUploads::new(&config.storage.upload_dir)?);
        let http = reqwest::Client::builder()
            .user_agent(concat!("post-receiver/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let ingestor = Ingestor::new(Arc::clone(&uploads), http, config.max_upload_size);

        Ok(Arc::new(Self {
            config,
            catalog: Catalog::new(),
            ingestor,
            uploads,
        }))
    }
}
