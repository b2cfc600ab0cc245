//! bandcoach-providers — model-service integrations.
//!
//! Implements the `ModelInvoker` trait for OpenAI-compatible chat and
//! transcription endpoints, and loads the configuration that wires an
//! invoker into the evaluation pipeline.

pub mod config;
pub mod mock;
pub mod openai;

pub use bandcoach_core::error::ProviderError;
pub use config::{
    create_invoker, load_config, load_config_from, BandcoachConfig, OpenAiConfig, API_KEY_ENV,
};
