use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::response::ApiError;
use crate::uploads::UploadStoreError;
use crate::AppState;

/// Serve a stored image by its file name.
/// Route: GET /uploads/:filename
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (reader, len) = state.uploads.open(&filename).await.map_err(|e| match e {
        UploadStoreError::NotFound(_) | UploadStoreError::InvalidName(_) => {
            ApiError::not_found("File not found")
        }
        UploadStoreError::Io(_) => ApiError::internal(format!("Failed to read file: {e}")),
    })?;

    let mut response = (StatusCode::OK, Body::from_stream(ReaderStream::new(reader))).into_response();
    let headers = response.headers_mut();

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        mime.as_ref()
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    // Multipart uploads keep the client's name and may overwrite it
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(response)
}
