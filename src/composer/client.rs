use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::ComposerError;
use crate::api::handlers::UploadPostResponse;
use crate::api::response::ErrorBody;

/// Submits composed images to a post-receiver server.
#[derive(Clone)]
pub struct PostClient {
    http: reqwest::Client,
    server_url: String,
}

/// An encoded image ready for upload.
pub struct UploadImage {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl PostClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ComposerError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("post-composer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, server_url))
    }

    pub fn with_client(http: reqwest::Client, server_url: impl Into<String>) -> Self {
        Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// POST the image to `/api/posts/upload` as the `post` file field.
    pub async fn upload(
        &self,
        image: UploadImage,
        sport: &str,
        faculties: &[String],
        metadata: Option<&Value>,
    ) -> Result<UploadPostResponse, ComposerError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(image.mime_type)?;

        let mut form = Form::new()
            .part("post", part)
            .text("sport", sport.to_string())
            .text("faculties", serde_json::to_string(faculties)?)
            .text("timestamp", Utc::now().timestamp_millis().to_string());
        if let Some(metadata) = metadata {
            form = form.text("metadata", serde_json::to_string(metadata)?);
        }

        let response = self
            .http
            .post(format!("{}/api/posts/upload", self.server_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            return Err(ComposerError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
