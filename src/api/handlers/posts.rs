use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson};
use crate::catalog::{Post, PostSummary};
use crate::ingest::{fields, ImagePayload};
use crate::AppState;

/// MIME types accepted for multipart uploads.
pub const ALLOWED_UPLOAD_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub sport: Option<Value>,
    pub faculties: Option<Value>,
    pub timestamp: Option<Value>,
    pub metadata: Option<Value>,
    pub image_base64: Option<String>,
    pub image_url: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub success: bool,
    pub post: Post,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadPostResponse {
    pub success: bool,
    pub message: String,
    pub post: PostSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub success: bool,
    pub count: usize,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SportPostsResponse {
    pub success: bool,
    pub sport: String,
    pub count: usize,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let payload = if let Some(data) = req.image_base64.filter(|s| !s.is_empty()) {
        Some(ImagePayload::Base64 {
            data,
            filename: req.filename,
        })
    } else {
        req.image_url
            .filter(|s| !s.is_empty())
            .map(ImagePayload::RemoteUrl)
    };

    let image = state
        .ingestor
        .ingest(payload)
        .await?;

    let post = state.catalog.insert(Post::new(
        fields::sport(req.sport.as_ref()),
        fields::faculties(req.faculties.as_ref()),
        image,
        fields::metadata(req.metadata),
        fields::timestamp(req.timestamp),
    ));

    tracing::info!(post_id = %post.id, sport = %post.sport, size = post.size, "Post received (JSON)");

    Ok(Json(PostResponse {
        success: true,
        post,
    }))
}

pub async fn upload_post(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadPostResponse>, ApiError> {
    let mut image: Option<ImagePayload> = None;
    let mut sport: Option<Value> = None;
    let mut faculties: Option<Value> = None;
    let mut timestamp: Option<Value> = None;
    let mut metadata: Option<Value> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "post" | "file" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = upload_content_type(field.content_type(), file_name.as_deref());
                if !ALLOWED_UPLOAD_TYPES.contains(&content_type.as_str()) {
                    return Err(ApiError::bad_request("Only PNG and JPEG images are allowed"));
                }

                let data = field.bytes().await?;
                if data.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {} bytes",
                        state.config.max_upload_size
                    )));
                }

                image = Some(ImagePayload::Multipart {
                    filename: file_name,
                    data,
                });
            }
            "sport" => sport = Some(Value::String(field.text().await?)),
            "faculties" => faculties = Some(Value::String(field.text().await?)),
            "timestamp" => timestamp = Some(Value::String(field.text().await?)),
            "metadata" => metadata = Some(Value::String(field.text().await?)),
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let image = image.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let stored = state
        .ingestor
        .ingest(Some(image))
        .await?;

    let post = state.catalog.insert(Post::new(
        fields::sport(sport.as_ref()),
        fields::faculties(faculties.as_ref()),
        stored,
        fields::metadata(metadata),
        fields::timestamp(timestamp),
    ));

    tracing::info!(
        post_id = %post.id,
        sport = %post.sport,
        faculties = %post.faculties.join(", "),
        filename = post.filename.as_deref().unwrap_or(""),
        size_kb = %format!("{:.2}", post.size as f64 / 1024.0),
        "Post received"
    );

    Ok(Json(UploadPostResponse {
        success: true,
        message: "Post uploaded successfully".to_string(),
        post: PostSummary::from(&post),
    }))
}

pub async fn list_posts(State(state): State<Arc<AppState>>) -> Json<PostListResponse> {
    let posts = state.catalog.list_all();
    Json(PostListResponse {
        success: true,
        count: posts.len(),
        posts,
    })
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .catalog
        .get(&id)
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostResponse {
        success: true,
        post,
    }))
}

pub async fn list_posts_by_sport(
    State(state): State<Arc<AppState>>,
    Path(sport): Path<String>,
) -> Json<SportPostsResponse> {
    let posts = state.catalog.filter_by_sport(&sport);
    Json(SportPostsResponse {
        success: true,
        sport,
        count: posts.len(),
        posts,
    })
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .catalog
        .delete(&id, state.uploads.as_ref())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Post deleted successfully".to_string(),
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// MIME essence of an uploaded part: the declared Content-Type, or a guess
/// from the file name when the client sent none or a generic one.
fn upload_content_type(declared: Option<&str>, file_name: Option<&str>) -> String {
    declared
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .or_else(|| {
            file_name
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.essence_str().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
