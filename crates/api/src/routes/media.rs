//! Media generation routes.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::media;
use crate::state::AppState;

/// Mount media routes (intended for nesting under `/media`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(media::list_media))
        .route("/generate", post(media::submit_media))
        .route("/selectable-images", get(media::selectable_images))
        .route("/{id}/status", get(media::poll_status))
        .route("/{id}", delete(media::delete_media))
}
