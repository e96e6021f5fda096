mod health;
mod posts;
mod uploads;

pub use health::{health, HealthResponse};
pub use posts::{
    create_post, delete_post, get_post, list_posts, list_posts_by_sport, upload_post,
    CreatePostRequest, MessageResponse, PostListResponse, PostResponse, SportPostsResponse,
    UploadPostResponse, ALLOWED_UPLOAD_TYPES,
};
pub use uploads::serve_upload;
