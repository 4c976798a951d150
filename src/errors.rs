use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::planner::slots::SlotError;
use crate::plans::model::PlanError;

/// Error returned by every handler. Internal details are logged here and never
/// sent to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),

    #[error("Conflict: {message}")]
    Conflict { message: String, details: Value },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SlotError> for AppError {
    fn from(e: SlotError) -> Self {
        match e {
            SlotError::CapReached { .. } | SlotError::SlotLocked { .. } => {
                AppError::Unprocessable(e.to_string())
            }
            SlotError::DayOutOfRange { .. }
            | SlotError::SnackIndexOutOfRange { .. }
            | SlotError::EmptySlot { .. } => AppError::Validation(e.to_string()),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::NotFound(_) => AppError::NotFound(e.to_string()),
            PlanError::EmptyName | PlanError::NoDays | PlanError::DateOutOfRange => {
                AppError::Validation(e.to_string())
            }
            PlanError::Overlap(ref conflicts) => AppError::Conflict {
                message: e.to_string(),
                details: json!({ "conflicts": conflicts }),
            },
            PlanError::UnknownSchema { .. } => AppError::Internal(anyhow::anyhow!(e)),
            PlanError::Storage(inner) => AppError::Internal(inner),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg, None),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg, None),
            AppError::Unprocessable(msg) => ("UNPROCESSABLE_ENTITY", msg, None),
            AppError::Conflict { message, details } => ("CONFLICT", message, Some(details)),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg, None),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({ "code": code, "message": message });
        if let Some(details) = details {
            error["details"] = details;
        }
        (status, Json(json!({ "error": error }))).into_response()
    }
}
