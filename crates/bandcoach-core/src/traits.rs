//! The model-service seam.
//!
//! `ModelInvoker` is implemented by the `bandcoach-providers` crate. The
//! pipeline receives one at construction time, so tests can substitute a
//! double that replies with malformed, slow, or failing output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::AudioClip;

// ---------------------------------------------------------------------------
// Model invoker trait
// ---------------------------------------------------------------------------

/// Trait for language-model backends that complete prompts and transcribe
/// audio.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Human-readable backend name (e.g. "openai").
    fn name(&self) -> &str;

    /// Whether a credential is configured. Checked before any other work.
    fn has_credential(&self) -> bool;

    /// Send a system/user prompt pair and return the raw reply text.
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;

    /// Turn an audio recording into text.
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> anyhow::Result<TranscriptionResponse>;
}

/// How the reply should be formatted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free text.
    #[default]
    Text,
    /// Ask the service for a single JSON object, when it supports that mode.
    JsonObject,
}

/// Request to complete a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "gpt-4o-mini").
    pub model: String,
    /// System-role instruction.
    pub system_prompt: String,
    /// User-role content.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate; the service default when absent.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Requested reply format.
    #[serde(default)]
    pub response_format: ResponseFormat,
}

/// Raw reply from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The reply text, unparsed.
    pub content: String,
    /// Model that actually produced the reply.
    pub model: String,
    /// Token usage.
    #[serde(default)]
    pub usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token usage reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Request to transcribe a recording.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Transcription model identifier (e.g. "whisper-1").
    pub model: String,
    /// ISO-639-1 language hint.
    pub language: String,
    /// The recording.
    pub audio: AudioClip,
}

/// Reply from a transcription request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}
