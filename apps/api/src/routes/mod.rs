pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Document API
        .route(
            "/api/v1/document",
            get(session::handle_get_document).put(session::handle_load_document),
        )
        .route("/api/v1/document/selection", put(session::handle_select))
        .route("/api/v1/images", post(session::handle_upload_image))
        // Command protocol
        .route("/api/v1/commands", post(session::handle_command))
        // Extraction API
        .route(
            "/api/v1/extract/specs",
            post(extraction::handle_extract_specs),
        )
        .route(
            "/api/v1/extract/layout",
            post(extraction::handle_extract_layout),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
