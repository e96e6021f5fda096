use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::uploads::StoredFile;

/// Public path prefix stored images are served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// A generated post kept in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Empty until the catalog assigns one on insert.
    pub id: String,
    pub sport: String,
    pub faculties: Vec<String>,

    // Image fields (absent when no image was ingested)
    pub filename: Option<String>,
    pub filepath: Option<PathBuf>,
    pub url: Option<String>,
    pub size: u64,

    pub metadata: Option<serde_json::Value>,
    #[serde(serialize_with = "iso_millis")]
    pub uploaded_at: DateTime<Utc>,
    /// Client-supplied value, or insertion time in epoch milliseconds.
    pub timestamp: serde_json::Value,
}

impl Post {
    pub fn new(
        sport: String,
        faculties: Vec<String>,
        image: Option<StoredFile>,
        metadata: Option<serde_json::Value>,
        timestamp: serde_json::Value,
    ) -> Self {
        let (filename, filepath, size) = match image {
            Some(file) => (Some(file.filename), Some(file.path), file.size),
            None => (None, None, 0),
        };

        Self {
            id: String::new(),
            sport,
            faculties,
            url: filename.as_deref().map(upload_url),
            filename,
            filepath,
            size,
            metadata,
            uploaded_at: Utc::now(),
            timestamp,
        }
    }
}

/// Reduced view returned by the multipart upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub sport: String,
    pub faculties: Vec<String>,
    pub url: Option<String>,
    #[serde(serialize_with = "iso_millis")]
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            sport: post.sport.clone(),
            faculties: post.faculties.clone(),
            url: post.url.clone(),
            uploaded_at: post.uploaded_at,
        }
    }
}

pub fn upload_url(filename: &str) -> String {
    format!("{UPLOADS_URL_PREFIX}/{filename}")
}

fn iso_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
