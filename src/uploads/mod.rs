mod local;

pub use local::LocalUploads;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum UploadStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Upload not found: {0}")]
    NotFound(String),
    #[error("Invalid upload name: {0:?}")]
    InvalidName(String),
}

/// A file written to the uploads directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

pub type UploadReader = Box<dyn AsyncRead + Send + Unpin>;

/// The directory that post images live in, keyed by bare file name.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Write `data` under `filename`, creating the directory if needed.
    /// An existing file with the same name is overwritten.
    async fn put(&self, filename: &str, data: Bytes) -> Result<StoredFile, UploadStoreError>;
    /// Open a stored file for streaming, along with its length in bytes.
    async fn open(&self, filename: &str) -> Result<(UploadReader, u64), UploadStoreError>;
    /// Remove a stored file. Removing a file that is already gone succeeds.
    async fn delete(&self, filename: &str) -> Result<(), UploadStoreError>;
}

/// Reject anything that is not a single plain path component.
pub fn validate_name(filename: &str) -> Result<(), UploadStoreError> {
    let plain = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0']);
    if plain {
        Ok(())
    } else {
        Err(UploadStoreError::InvalidName(filename.to_string()))
    }
}
