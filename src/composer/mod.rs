//! Client side: render text onto a post template and upload the result.

mod client;
pub mod config;
mod render;

pub use client::{PostClient, UploadImage};
pub use config::ComposerConfig;
pub use render::{output_filename, Composer};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::api::handlers::UploadPostResponse;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),
    #[error("Invalid composer configuration: {0}")]
    InvalidConfig(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Input for one post in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    pub sport: String,
    pub faculties: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug)]
pub struct GeneratedPost {
    pub path: PathBuf,
    pub response: UploadPostResponse,
}

/// An image previously written to the output folder.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Compose, save and upload posts.
pub struct PostGenerator {
    composer: Composer,
    client: PostClient,
}

impl PostGenerator {
    pub fn new(composer: Composer, client: PostClient) -> Self {
        Self { composer, client }
    }

    pub async fn generate_post(&self, request: &PostRequest) -> Result<GeneratedPost, ComposerError> {
        let image = self.composer.compose(&request.sport, &request.faculties)?;
        let bytes = self.composer.encode(&image)?;
        let path = self.composer.save(&request.sport, &bytes)?;
        tracing::info!(path = %path.display(), sport = %request.sport, "Composed post");

        let format = self.composer.config().output.format;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("post.{}", format.extension()));

        let response = self
            .client
            .upload(
                UploadImage {
                    filename,
                    mime_type: format.mime_type(),
                    bytes,
                },
                &request.sport,
                &request.faculties,
                request.metadata.as_ref(),
            )
            .await?;
        tracing::info!(post_id = %response.post.id, "Uploaded post");

        Ok(GeneratedPost { path, response })
    }

    /// Generate posts one after another. A failure does not stop the batch.
    pub async fn generate_many(
        &self,
        requests: &[PostRequest],
    ) -> Vec<Result<GeneratedPost, ComposerError>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.generate_post(request).await;
            if let Err(e) = &result {
                tracing::warn!(sport = %request.sport, error = %e, "Failed to generate post");
            }
            results.push(result);
        }
        results
    }

    pub fn list_generated(&self) -> Result<Vec<GeneratedFile>, ComposerError> {
        list_generated(&self.composer.config().output_folder)
    }
}

/// Image files in `folder`, newest first. A missing folder has no files.
pub fn list_generated(folder: &Path) -> Result<Vec<GeneratedFile>, ComposerError> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"));
        let metadata = entry.metadata()?;
        if !metadata.is_file() || !is_image {
            continue;
        }

        let created = metadata.created().or_else(|_| metadata.modified())?;
        files.push(GeneratedFile {
            filename: entry.file_name().to_string_lossy().into_owned(),
            path,
            created_at: DateTime::<Utc>::from(created),
        });
    }

    files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(files)
}
