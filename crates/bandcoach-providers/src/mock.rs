//! Mock invoker for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use bandcoach_core::error::ProviderError;
use bandcoach_core::traits::{
    CompletionRequest, CompletionResponse, ModelInvoker, TokenUsage, TranscriptionRequest,
    TranscriptionResponse,
};

/// A mock model service for exercising the pipeline and HTTP layer without
/// real API calls.
///
/// Returns configurable replies based on prompt content matching.
pub struct MockInvoker {
    /// Map of prompt substring → reply.
    responses: HashMap<String, String>,
    /// Reply if no prompt matches.
    default_response: String,
    /// Text returned for every transcription.
    transcript: String,
    /// When set, every call fails with a network error carrying this message.
    failure: Option<String>,
    /// Whether a credential is reported as configured.
    credential: bool,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last completion request received.
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockInvoker {
    /// Create a mock with the given prompt→reply mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: String::new(),
            transcript: String::new(),
            failure: None,
            credential: true,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.default_response = response.to_string();
        mock
    }

    /// Create a mock whose calls all fail at the transport level.
    pub fn failing(message: &str) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.failure = Some(message.to_string());
        mock
    }

    pub fn with_transcript(mut self, transcript: &str) -> Self {
        self.transcript = transcript.to_string();
        self
    }

    /// Report no configured credential.
    pub fn without_credential(mut self) -> Self {
        self.credential = false;
        self
    }

    /// Get the number of calls made to this invoker.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last completion request made to this invoker.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn record_call(&self) -> Result<(), ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if !self.credential {
            return Err(ProviderError::MissingCredential);
        }
        match &self.failure {
            Some(message) => Err(ProviderError::NetworkError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ModelInvoker for MockInvoker {
    fn name(&self) -> &str {
        "mock"
    }

    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        self.record_call()?;

        // Find a matching reply based on prompt content
        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.user_prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        let prompt_tokens = (request.user_prompt.len() / 4) as u32; // Rough estimate
        let completion_tokens = (content.len() / 4) as u32;

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    async fn transcribe(
        &self,
        _request: &TranscriptionRequest,
    ) -> anyhow::Result<TranscriptionResponse> {
        self.record_call()?;
        Ok(TranscriptionResponse {
            text: self.transcript.clone(),
            latency_ms: 1,
        })
    }
}
