use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::layout::LayoutError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Another command is still running")]
    Busy,

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Busy => "BUSY",
            AppError::Layout(LayoutError::NotAMaster) => "NOT_A_MASTER",
            AppError::Layout(LayoutError::MissingSlot(_)) => "MISSING_SLOT",
            AppError::Layout(LayoutError::MissingImage) => "MISSING_IMAGE",
            AppError::Layout(LayoutError::ImageFetch(_)) => "IMAGE_FETCH_ERROR",
            AppError::Layout(LayoutError::FontLoad(_)) => "FONT_LOAD_ERROR",
            AppError::Layout(LayoutError::InvalidMaster(_)) => "INVALID_MASTER",
            AppError::Layout(LayoutError::InvalidArgument(_)) => "INVALID_ARGUMENT",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Busy => StatusCode::CONFLICT,
            AppError::Layout(LayoutError::NotAMaster | LayoutError::InvalidArgument(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Layout(LayoutError::ImageFetch(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Layout(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The single human-readable line shown to the user.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Layout(e) => e.to_string(),
            AppError::ExternalService(msg) => msg.clone(),
            AppError::Busy => self.to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::ExternalService(msg) => tracing::error!("External service error: {msg}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::Layout(e) => tracing::warn!("Layout error: {e}"),
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.message()
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Slot;

    #[test]
    fn test_missing_slot_names_the_layer() {
        let err = AppError::from(LayoutError::MissingSlot(Slot::Disclaimer));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "MISSING_SLOT");
        assert_eq!(err.message(), "Layer \"disclaimer\" was not found in the master");
    }

    #[test]
    fn test_busy_maps_to_conflict() {
        assert_eq!(AppError::Busy.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = AppError::Internal(anyhow::anyhow!("secret path /etc/x"));
        assert!(!err.message().contains("secret"));
    }
}
