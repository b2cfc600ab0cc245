//! bandcoach-core — the evaluation response pipeline.
//!
//! This crate composes task-specific prompts, hands them to a
//! [`traits::ModelInvoker`], and normalizes the reply into one of a few
//! strict result shapes, however unreliable the model's output.

pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod results;
pub mod traits;

pub use error::{ErrorClass, PipelineError, ProviderError};
pub use pipeline::{EvaluationPipeline, PipelineConfig};
