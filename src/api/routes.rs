use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Room for the text fields and multipart framing around the image itself.
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload = usize::try_from(state.config.max_upload_size).unwrap_or(usize::MAX);
    let upload_limit = max_upload.saturating_add(FORM_OVERHEAD);
    // base64 inflates the image by 4/3
    let json_limit = (max_upload / 3)
        .saturating_mul(4)
        .saturating_add(FORM_OVERHEAD);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Posts
        .route(
            "/api/posts",
            get(handlers::list_posts)
                .post(handlers::create_post)
                .layer(DefaultBodyLimit::max(json_limit)),
        )
        .route(
            "/api/posts/upload",
            post(handlers::upload_post).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/posts/sport/:sport",
            get(handlers::list_posts_by_sport),
        )
        .route(
            "/api/posts/:id",
            get(handlers::get_post).delete(handlers::delete_post),
        )
        // Stored images
        .route("/uploads/:filename", get(handlers::serve_upload))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
