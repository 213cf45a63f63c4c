//! Axum route handlers for the Extraction API. Both take the raw image as the request body.

use axum::{extract::State, Json};
use bytes::Bytes;

use crate::errors::AppError;
use crate::extraction::{analyze_layout, parse_specs};
use crate::models::ad::{AdSpecification, LayoutPlacement};
use crate::state::AppState;

fn require_image(body: &Bytes) -> Result<(), AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("Request body must contain an image".to_string()));
    }
    Ok(())
}

/// POST /api/v1/extract/specs
pub async fn handle_extract_specs(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AdSpecification>, AppError> {
    require_image(&body)?;
    Ok(Json(parse_specs(body, &state.vision).await?))
}

/// POST /api/v1/extract/layout
pub async fn handle_extract_layout(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LayoutPlacement>, AppError> {
    require_image(&body)?;
    Ok(Json(analyze_layout(body, &state.vision).await?))
}
