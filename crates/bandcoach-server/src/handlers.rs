//! Route handlers.
//!
//! Each handler checks the credential before looking at its body, so a
//! server without an API key answers every operation with the same
//! configuration error.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;

use bandcoach_core::model::{AudioClip, EvaluationRequest, TaskKind};
use bandcoach_core::results::EvaluationOutcome;

use crate::dto::*;
use crate::error::AppError;
use crate::ServerState;

/// Multipart field carrying the recording.
pub const AUDIO_FIELD: &str = "audio";

type Outcome = Result<Json<EvaluationOutcome>, AppError>;

async fn run_json<B>(
    state: &ServerState,
    kind: TaskKind,
    payload: Result<Json<B>, JsonRejection>,
) -> Outcome
where
    B: Into<EvaluationRequest>,
{
    state.pipeline.ensure_configured(kind)?;
    let Json(body) = payload.map_err(|rejection| AppError::malformed(kind, rejection))?;
    let outcome = state.pipeline.run(body.into()).await?;
    Ok(Json(outcome))
}

/// POST /api/reading/generate
pub async fn generate_reading(
    State(state): State<ServerState>,
    payload: Result<Json<GenerateReadingBody>, JsonRejection>,
) -> Outcome {
    run_json(&state, TaskKind::GenerateReadingQuestions, payload).await
}

/// POST /api/listening/generate
pub async fn generate_listening(
    State(state): State<ServerState>,
    payload: Result<Json<GenerateListeningBody>, JsonRejection>,
) -> Outcome {
    run_json(&state, TaskKind::GenerateListeningQuestions, payload).await
}

/// POST /api/reading/evaluate
pub async fn evaluate_reading(
    State(state): State<ServerState>,
    payload: Result<Json<ReadingAnswersBody>, JsonRejection>,
) -> Outcome {
    run_json(&state, TaskKind::EvaluateReading, payload).await
}

/// POST /api/listening/evaluate
pub async fn evaluate_listening(
    State(state): State<ServerState>,
    payload: Result<Json<ListeningAnswersBody>, JsonRejection>,
) -> Outcome {
    run_json(&state, TaskKind::EvaluateListening, payload).await
}

/// POST /api/writing/evaluate
pub async fn evaluate_writing(
    State(state): State<ServerState>,
    payload: Result<Json<WritingBody>, JsonRejection>,
) -> Outcome {
    run_json(&state, TaskKind::EvaluateWriting, payload).await
}

/// POST /api/speaking/evaluate
pub async fn evaluate_speaking(
    State(state): State<ServerState>,
    payload: Result<Json<SpeakingBody>, JsonRejection>,
) -> Outcome {
    run_json(&state, TaskKind::EvaluateSpeaking, payload).await
}

/// POST /api/speaking/transcribe, multipart upload with an `audio` field.
pub async fn transcribe_speech(
    State(state): State<ServerState>,
    payload: Result<Multipart, MultipartRejection>,
) -> Outcome {
    let kind = TaskKind::TranscribeSpeech;
    state.pipeline.ensure_configured(kind)?;
    let mut multipart = payload.map_err(|rejection| AppError::malformed(kind, rejection))?;

    let mut audio = AudioClip::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::malformed(kind, e))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        audio.file_name = field.file_name().map(str::to_string);
        audio.content_type = field.content_type().map(str::to_string);
        audio.data = field
            .bytes()
            .await
            .map_err(|e| AppError::malformed(kind, e))?
            .to_vec();
        break;
    }

    let outcome = state
        .pipeline
        .run(EvaluationRequest::TranscribeSpeech { audio })
        .await?;
    Ok(Json(outcome))
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}
