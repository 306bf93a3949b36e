//! # error
//!
//! Centralised application error type.
//!
//! Every handler returns `Result<_, AppError>`.  Axum's `IntoResponse` impl
//! converts these into `{ "success": false, "error": "..." }` so MT5 EAs can
//! branch on one boolean whatever went wrong.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::relay::RelayError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing / malformed field or invalid enum value.  Always 400.
    #[error("{0}")]
    Validation(String),

    /// Catch-all for unexpected failures.  Logged, then 500.
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

/// Unparsable or missing JSON body.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(err) => {
                error!(error = %err, "Request failed with internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "success": false,
            "error":   self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// `CatchPanicLayer` hook: a panicking handler becomes a 500 with the usual
/// body and the server keeps serving.
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    AppError::Internal(anyhow::anyhow!(message)).into_response()
}
