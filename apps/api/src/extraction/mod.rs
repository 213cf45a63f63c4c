//! Extraction — turns a specification sheet or a master screenshot into typed
//! generation inputs by asking the vision service.
//!
//! Answers are validated while they are deserialized; anything the layout
//! engine could not use is rejected here as an external-service failure.

pub mod handlers;

use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::models::ad::{AdSpecification, LayoutPlacement};
use crate::vision_client::prompts::{ANALYZE_LAYOUT, PARSE_SPECS};
use crate::vision_client::VisionClient;

/// Reads a technical specification sheet.
pub async fn parse_specs(image: Bytes, vision: &VisionClient) -> Result<AdSpecification, AppError> {
    let spec: AdSpecification = vision
        .run_json(PARSE_SPECS, image)
        .await
        .map_err(|e| AppError::ExternalService(format!("Specification parsing failed: {e}")))?;
    info!(
        "Parsed specification '{}': {}x{} cm @ {} dpi",
        spec.name, spec.total_width_cm, spec.total_height_cm, spec.dpi
    );
    Ok(spec)
}

/// Estimates the photo/text arrangement of a master screenshot.
pub async fn analyze_layout(image: Bytes, vision: &VisionClient) -> Result<LayoutPlacement, AppError> {
    let placement: LayoutPlacement = vision
        .run_json(ANALYZE_LAYOUT, image)
        .await
        .map_err(|e| AppError::ExternalService(format!("Layout analysis failed: {e}")))?;
    info!(
        "Layout hint: photo {:?}, text {:?}, split {}",
        placement.photo_zone, placement.text_zone, placement.split_ratio
    );
    Ok(placement)
}
