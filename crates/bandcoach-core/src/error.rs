//! Error types for model invocation and the evaluation pipeline.
//!
//! `ProviderError` is defined here rather than in `bandcoach-providers` so the
//! pipeline can downcast invoker errors and classify them without string
//! matching.

use thiserror::Error;

use crate::model::TaskKind;

/// Errors that can occur when talking to the model service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key is configured for the service.
    #[error("OpenAI API key is not configured")]
    MissingCredential,

    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if the failure stems from configuration rather than the
    /// service being degraded.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::MissingCredential)
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Broad classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The service credential is absent.
    Configuration,
    /// The caller sent incomplete input.
    Validation,
    /// The model service failed at the transport level.
    Service,
}

/// Terminal failures of a single pipeline run.
///
/// Malformed model output is never one of these: it is absorbed by the
/// parsers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("OpenAI API key is not configured")]
    MissingCredential,

    #[error("{message}")]
    Validation { kind: TaskKind, message: String },

    #[error("{}: {message}", kind.failure_message())]
    Service { kind: TaskKind, message: String },
}

impl PipelineError {
    /// Validation failure carrying the kind's standard message.
    pub fn missing_fields(kind: TaskKind) -> Self {
        PipelineError::Validation {
            kind,
            message: kind.required_fields_message().to_string(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::MissingCredential => ErrorClass::Configuration,
            PipelineError::Validation { .. } => ErrorClass::Validation,
            PipelineError::Service { .. } => ErrorClass::Service,
        }
    }

    /// The task kind the failure belongs to, when known.
    pub fn kind(&self) -> Option<TaskKind> {
        match self {
            PipelineError::MissingCredential => None,
            PipelineError::Validation { kind, .. } | PipelineError::Service { kind, .. } => {
                Some(*kind)
            }
        }
    }
}
