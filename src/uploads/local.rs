use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{validate_name, StoredFile, UploadReader, UploadStore, UploadStoreError};

/// Uploads directory on the local filesystem.
///
/// The directory is not touched until the first write, so pointing the
/// store at a path that does not exist yet is fine.
pub struct LocalUploads {
    base_path: PathBuf,
}

impl LocalUploads {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = std::path::absolute(base_path.as_ref())?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn upload_path(&self, filename: &str) -> Result<PathBuf, UploadStoreError> {
        validate_name(filename)?;
        Ok(self.base_path.join(filename))
    }
}

#[async_trait]
impl UploadStore for LocalUploads {
    async fn put(&self, filename: &str, data: Bytes) -> Result<StoredFile, UploadStoreError> {
        let path = self.upload_path(filename)?;
        tokio::fs::create_dir_all(&self.base_path).await?;
        tokio::fs::write(&path, &data).await?;
        let size = tokio::fs::metadata(&path).await?.len();
        Ok(StoredFile {
            filename: filename.to_string(),
            path,
            size,
        })
    }

    async fn open(&self, filename: &str) -> Result<(UploadReader, u64), UploadStoreError> {
        let path = self.upload_path(filename)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(UploadStoreError::NotFound(filename.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(UploadStoreError::NotFound(filename.to_string()));
        }
        let reader: UploadReader = Box::new(file);
        Ok((reader, metadata.len()))
    }

    async fn delete(&self, filename: &str) -> Result<(), UploadStoreError> {
        let path = self.upload_path(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
