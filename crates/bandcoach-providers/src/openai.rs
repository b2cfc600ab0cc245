//! OpenAI-compatible chat-completion and audio-transcription client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bandcoach_core::error::ProviderError;
use bandcoach_core::traits::{
    CompletionRequest, CompletionResponse, ModelInvoker, ResponseFormat, TokenUsage,
    TranscriptionRequest, TranscriptionResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_AUDIO_NAME: &str = "recording.webm";
const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// OpenAI-compatible API invoker.
///
/// Constructed even without a key so the server can start and report the
/// misconfiguration per request.
pub struct OpenAiInvoker {
    api_key: Option<String>,
    base_url: String,
    org_id: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiInvoker {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        org_id: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            org_id,
            timeout_secs,
            client,
        })
    }

    /// Attach auth headers, or fail if there is no key.
    fn authorize(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential)?;

        let mut builder = builder.header("Authorization", format!("Bearer {key}"));
        if let Some(org) = &self.org_id {
            builder = builder.header("OpenAI-Organization", org);
        }
        Ok(builder)
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::NetworkError(e.to_string())
        }
    }

    /// Map non-success statuses onto `ProviderError`.
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body));
        }
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ModelNotFound(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            });
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ChatResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
    model: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct TranscriptionBody {
    text: String,
}

#[async_trait]
impl ModelInvoker for OpenAiInvoker {
    fn name(&self) -> &str {
        "openai"
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        let start = Instant::now();

        let body = ChatRequest {
            model: &request.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            response_format: match request.response_format {
                ResponseFormat::JsonObject => Some(ChatResponseFormat {
                    kind: "json_object",
                }),
                ResponseFormat::Text => None,
            },
        };

        let req = self.authorize(
            self.client
                .post(format!("{}/v1/chat/completions", self.base_url))
                .header("content-type", "application/json"),
        )?;

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = self.check_status(response).await?;

        let api_response: ChatResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        tracing::debug!(
            prompt_tokens = api_response.usage.prompt_tokens,
            completion_tokens = api_response.usage.completion_tokens,
            latency_ms,
            "chat completion finished"
        );

        Ok(CompletionResponse {
            content,
            model: api_response.model,
            usage: TokenUsage {
                prompt_tokens: api_response.usage.prompt_tokens,
                completion_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            latency_ms,
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model, bytes = request.audio.data.len()))]
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> anyhow::Result<TranscriptionResponse> {
        let start = Instant::now();
        let audio = &request.audio;

        let file = reqwest::multipart::Part::bytes(audio.data.clone())
            .file_name(
                audio
                    .file_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AUDIO_NAME.to_string()),
            )
            .mime_str(audio.content_type.as_deref().unwrap_or(DEFAULT_AUDIO_MIME))
            .map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("invalid audio content type: {e}"),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", request.model.clone())
            .text("language", request.language.clone())
            .text("response_format", "json");

        let req = self.authorize(
            self.client
                .post(format!("{}/v1/audio/transcriptions", self.base_url)),
        )?;

        let response = req
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = self.check_status(response).await?;

        let body: TranscriptionBody =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        Ok(TranscriptionResponse {
            text: body.text,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
