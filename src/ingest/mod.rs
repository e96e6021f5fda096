//! Turns the three accepted image payloads into one stored file.

pub mod fields;

use std::path::Path;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use thiserror::Error;

use crate::uploads::{validate_name, StoredFile, UploadStore, UploadStoreError};

pub const DEFAULT_EXTENSION: &str = "png";

/// Standard alphabet, padding optional, stray trailing bits ignored.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Invalid image URL {0}")]
    InvalidUrl(String),
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Image exceeds maximum upload size of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Failed to store image: {0}")]
    Store(#[from] UploadStoreError),
}

/// An image as it arrives at the service.
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// Bytes of a multipart file field, stored under the client's file name.
    Multipart {
        filename: Option<String>,
        data: Bytes,
    },
    /// A `data:image/<type>;base64,` URL or bare base64. `filename` only
    /// supplies the extension for bare base64.
    Base64 {
        data: String,
        filename: Option<String>,
    },
    /// An http(s) URL to download.
    RemoteUrl(String),
}

pub struct Ingestor {
    store: Arc<dyn UploadStore>,
    http: reqwest::Client,
    /// Largest remote image accepted, in bytes
    max_fetch_size: u64,
}

impl Ingestor {
    pub fn new(store: Arc<dyn UploadStore>, http: reqwest::Client, max_fetch_size: u64) -> Self {
        Self {
            store,
            http,
            max_fetch_size,
        }
    }

    /// Write the payload to the uploads directory. `None` means the request
    /// carried no image, which is not an error.
    pub async fn ingest(
        &self,
        payload: Option<ImagePayload>,
    ) -> Result<Option<StoredFile>, IngestError> {
        let Some(payload) = payload else {
            return Ok(None);
        };

        let (filename, data) = match payload {
            ImagePayload::Multipart { filename, data } => {
                let name = filename.as_deref().and_then(client_file_name).unwrap_or_else(|| {
                    let extension = filename.as_deref().and_then(extension_of);
                    generate_filename(extension.as_deref().unwrap_or(DEFAULT_EXTENSION))
                });
                (name, data)
            }
            ImagePayload::Base64 { data, filename } => {
                let (extension, decoded) = decode_base64_image(&data, filename.as_deref())?;
                (generate_filename(&extension), Bytes::from(decoded))
            }
            ImagePayload::RemoteUrl(url) => {
                let (extension, body) = self.fetch(&url).await?;
                (generate_filename(&extension), body)
            }
        };

        let stored = self.store.put(&filename, data).await?;
        tracing::debug!(
            filename = %stored.filename,
            size = stored.size,
            "Stored image"
        );
        Ok(Some(stored))
    }

    async fn fetch(&self, url: &str) -> Result<(String, Bytes), IngestError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| IngestError::InvalidUrl(format!("{url}: {e}")))?;
        let extension = extension_of(parsed.path()).unwrap_or_else(|| DEFAULT_EXTENSION.into());

        let too_large = || IngestError::TooLarge {
            limit: self.max_fetch_size,
        };

        let mut response = self.http.get(parsed).send().await?.error_for_status()?;
        if response
            .content_length()
            .is_some_and(|len| len > self.max_fetch_size)
        {
            return Err(too_large());
        }

        // Content-Length can be absent or understated
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > self.max_fetch_size {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok((extension, body.freeze()))
    }
}

/// Decode a data URL or bare base64 string, returning the file extension to
/// use and the decoded bytes.
pub fn decode_base64_image(
    input: &str,
    filename: Option<&str>,
) -> Result<(String, Vec<u8>), IngestError> {
    let (extension, payload) = match split_data_url(input) {
        Some((subtype, payload)) => (subtype.to_string(), payload),
        None => {
            let extension = filename
                .and_then(extension_of)
                .unwrap_or_else(|| DEFAULT_EXTENSION.into());
            (extension, input)
        }
    };

    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    Ok((extension, LENIENT_BASE64.decode(cleaned)?))
}

/// Split `data:image/<subtype>;base64,<payload>` into subtype and payload.
pub fn split_data_url(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let subtype = mime.strip_prefix("image/")?;

    if !is_word(subtype) || payload.is_empty() {
        return None;
    }
    Some((subtype, payload))
}

/// `<epoch-millis>-<6 char token>.<ext>`
pub fn generate_filename(extension: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}.{extension}",
        Utc::now().timestamp_millis(),
        &token[..6]
    )
}

/// Extension of the last path component, kept only when it is plain word
/// characters so it can never smuggle a separator into a stored name.
fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| is_word(ext))
        .map(str::to_string)
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Last path component of a client-supplied name, if it is usable on disk
/// and round-trips through an unencoded `/uploads/<name>` URL.
fn client_file_name(name: &str) -> Option<String> {
    let base = Path::new(name).file_name()?.to_str()?;
    validate_name(base).ok()?;
    if base.contains(['%', '?', '#']) {
        return None;
    }
    Some(base.to_string())
}
