//! The evaluation pipeline.
//!
//! One run per learner request: validate, compose, invoke, parse. The
//! pipeline holds no per-request state and can be shared freely across
//! concurrent requests.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, ProviderError};
use crate::model::{EvaluationRequest, Rubric, TaskKind};
use crate::parser::{parse_criterion_result, parse_percentage, parse_question_list, ParseOutcome};
use crate::prompt::{compose, PromptTask};
use crate::results::{CriterionEvaluation, EvaluationOutcome, NarrativeEvaluation, Transcription};
use crate::traits::{CompletionRequest, ModelInvoker, TranscriptionRequest};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Completion model.
    pub model: String,
    /// Transcription model.
    pub transcription_model: String,
    /// Language hint for transcription.
    pub transcription_language: String,
    /// Max tokens per completion; the service default when absent.
    pub max_tokens: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            transcription_model: "whisper-1".to_string(),
            transcription_language: "en".to_string(),
            max_tokens: None,
        }
    }
}

/// Where a run currently is. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Composing,
    Invoking,
    Parsing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Composing => "composing",
            Stage::Invoking => "invoking",
            Stage::Parsing => "parsing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Orchestrates a single evaluation from learner input to normalized result.
pub struct EvaluationPipeline {
    invoker: Arc<dyn ModelInvoker>,
    config: PipelineConfig,
}

impl EvaluationPipeline {
    pub fn new(invoker: Arc<dyn ModelInvoker>, config: PipelineConfig) -> Self {
        Self { invoker, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fail fast when no credential is configured, logging the refused task.
    pub fn ensure_configured(&self, kind: TaskKind) -> Result<(), PipelineError> {
        if self.invoker.has_credential() {
            return Ok(());
        }
        let e = PipelineError::MissingCredential;
        error!(task = %kind, invoker = self.invoker.name(), "{e}");
        Err(e)
    }

    /// Run one request through the pipeline.
    pub async fn run(&self, request: EvaluationRequest) -> Result<EvaluationOutcome, PipelineError> {
        let kind = request.kind();

        self.ensure_configured(kind)?;

        debug!(task = %kind, stage = %Stage::Validating);
        if let Err(e) = request.validate() {
            warn!(task = %kind, "rejected request: {e}");
            return Err(e);
        }

        let outcome = match PromptTask::from_request(&request) {
            Some(task) => self.evaluate(kind, &task).await?,
            None => self.transcribe(kind, &request).await?,
        };

        debug!(task = %kind, stage = %Stage::Done);
        Ok(outcome)
    }

    async fn evaluate(
        &self,
        kind: TaskKind,
        task: &PromptTask<'_>,
    ) -> Result<EvaluationOutcome, PipelineError> {
        debug!(task = %kind, stage = %Stage::Composing);
        let prompt = compose(task);

        debug!(task = %kind, stage = %Stage::Invoking);
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: prompt.system,
            user_prompt: prompt.user,
            temperature: prompt.temperature,
            max_tokens: self.config.max_tokens,
            response_format: prompt.response_format,
        };
        let response = self
            .invoker
            .complete(&request)
            .await
            .map_err(|e| self.classify(kind, e))?;

        info!(
            task = %kind,
            model = %response.model,
            tokens = response.usage.total_tokens,
            latency_ms = response.latency_ms,
            "model replied"
        );

        debug!(task = %kind, stage = %Stage::Parsing);
        let content = response.content;
        let outcome = match task {
            PromptTask::QuestionGeneration { .. } => {
                let set = parse_question_list(&content);
                if set.is_empty() {
                    warn!(task = %kind, "reply contained no usable questions");
                }
                EvaluationOutcome::Questions(set)
            }
            PromptTask::AnswerEvaluation { .. } => EvaluationOutcome::Narrative(NarrativeEvaluation {
                score: parse_percentage(&content),
                feedback: content,
            }),
            PromptTask::EssayEvaluation { .. } => {
                EvaluationOutcome::Criterion(criterion_result(kind, &content, Rubric::Writing))
            }
            PromptTask::SpeechEvaluation { .. } => {
                EvaluationOutcome::Criterion(criterion_result(kind, &content, Rubric::Speaking))
            }
        };

        Ok(outcome)
    }

    async fn transcribe(
        &self,
        kind: TaskKind,
        request: &EvaluationRequest,
    ) -> Result<EvaluationOutcome, PipelineError> {
        let EvaluationRequest::TranscribeSpeech { audio } = request else {
            return Err(PipelineError::missing_fields(kind));
        };

        debug!(task = %kind, stage = %Stage::Invoking, bytes = audio.data.len());
        let response = self
            .invoker
            .transcribe(&TranscriptionRequest {
                model: self.config.transcription_model.clone(),
                language: self.config.transcription_language.clone(),
                audio: audio.clone(),
            })
            .await
            .map_err(|e| self.classify(kind, e))?;

        info!(task = %kind, latency_ms = response.latency_ms, "audio transcribed");
        Ok(EvaluationOutcome::Transcript(Transcription {
            transcript: response.text,
        }))
    }

    /// Sort an invoker failure into configuration or service error.
    fn classify(&self, kind: TaskKind, err: anyhow::Error) -> PipelineError {
        let is_configuration = err
            .downcast_ref::<ProviderError>()
            .is_some_and(ProviderError::is_configuration);

        let classified = if is_configuration {
            PipelineError::MissingCredential
        } else {
            PipelineError::Service {
                kind,
                message: format!("{err:#}"),
            }
        };

        error!(task = %kind, invoker = self.invoker.name(), "{classified}");
        classified
    }
}

fn criterion_result(kind: TaskKind, raw: &str, rubric: Rubric) -> CriterionEvaluation {
    match parse_criterion_result(raw, rubric) {
        ParseOutcome::Parsed(result) => {
            if !result.conforms_to(rubric) {
                warn!(task = %kind, "reply parsed but falls outside the {rubric:?} rubric");
            }
            result
        }
        ParseOutcome::Fallback(result) => {
            warn!(
                task = %kind,
                bytes = raw.len(),
                "reply did not match the result shape, using fallback bands"
            );
            result
        }
    }
}
