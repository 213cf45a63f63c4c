//! Axum route handlers for the document and the command protocol.
//!
//! Every handler that touches the session uses `try_lock`: while one command is
//! in flight, anything else is answered with `409 BUSY`.

use axum::{extract::State, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::MutexGuard;

use crate::document::model::{ImageHash, NodeId};
use crate::document::{Document, ImageStore};
use crate::errors::AppError;
use crate::layout::LayoutContext;
use crate::session::{Command, CommandResponse, Session};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub ids: Vec<NodeId>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: Vec<NodeId>,
}

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub hash: ImageHash,
}

fn acquire(state: &AppState) -> Result<MutexGuard<'_, Session>, AppError> {
    state.session.try_lock().map_err(|_| AppError::Busy)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/document
///
/// Replaces the working document and echoes it back with any missing node ids filled in.
pub async fn handle_load_document(
    State(state): State<AppState>,
    Json(document): Json<Document>,
) -> Result<Json<Document>, AppError> {
    let mut session = acquire(&state)?;
    session.load_document(document);
    Ok(Json(session.document().clone()))
}

/// GET /api/v1/document
pub async fn handle_get_document(State(state): State<AppState>) -> Result<Json<Document>, AppError> {
    let session = acquire(&state)?;
    Ok(Json(session.document().clone()))
}

/// PUT /api/v1/document/selection
pub async fn handle_select(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SelectionResponse>, AppError> {
    let mut session = acquire(&state)?;
    session.select(request.ids)?;
    Ok(Json(SelectionResponse {
        selection: session.document().selection.clone(),
    }))
}

/// POST /api/v1/images
///
/// Registers raw image bytes so document nodes can reference them by hash.
pub async fn handle_upload_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImageUploadResponse>, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("Request body must contain an image".to_string()));
    }
    let hash = state.images.register(body).await;
    Ok(Json(ImageUploadResponse { hash }))
}

/// POST /api/v1/commands
///
/// Body is a command object tagged by `type`. Malformed or invalid payloads are
/// validation errors, not extractor rejections, so the UI always gets error JSON.
pub async fn handle_command(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CommandResponse>, AppError> {
    let command: Command = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid command: {e}")))?;

    let mut session = acquire(&state)?;
    let ctx = LayoutContext {
        images: state.images.as_ref(),
        fonts: state.fonts.as_ref(),
    };
    let response = session.execute(command, &ctx).await?;
    Ok(Json(response))
}
