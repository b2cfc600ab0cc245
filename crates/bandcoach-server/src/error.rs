//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use bandcoach_core::model::TaskKind;
use bandcoach_core::{ErrorClass, PipelineError};

/// Request-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    /// The pipeline refused or failed the request.
    Pipeline(PipelineError),
    /// The body could not be extracted at all.
    Malformed { kind: TaskKind, details: String },
}

impl AppError {
    /// A body that failed JSON or multipart extraction.
    pub fn malformed(kind: TaskKind, rejection: impl std::fmt::Display) -> Self {
        AppError::Malformed {
            kind,
            details: rejection.to_string(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Pipeline(e)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Malformed { kind, details } => {
                tracing::warn!(task = %kind, "malformed request body: {details}");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: kind.required_fields_message().to_string(),
                        details: Some(details),
                    },
                )
            }
            AppError::Pipeline(e) => match e.class() {
                ErrorClass::Configuration => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: e.to_string(),
                        details: None,
                    },
                ),
                ErrorClass::Validation => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: e.to_string(),
                        details: None,
                    },
                ),
                ErrorClass::Service => {
                    let (error, details) = match e {
                        PipelineError::Service { kind, message } => {
                            (kind.failure_message().to_string(), Some(message))
                        }
                        other => (other.to_string(), None),
                    };
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse { error, details },
                    )
                }
            },
        };
        (status, Json(body)).into_response()
    }
}
