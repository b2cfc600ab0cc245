//! bandcoach-server — HTTP surface for the evaluation pipeline.
//!
//! Exposes one JSON route per learner operation plus a multipart
//! transcription route, all backed by a shared [`EvaluationPipeline`].

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use bandcoach_core::EvaluationPipeline;

/// Largest accepted audio upload, matching the transcription service's cap.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for route handlers.
#[derive(Clone)]
pub struct ServerState {
    pub pipeline: Arc<EvaluationPipeline>,
}

impl ServerState {
    pub fn new(pipeline: EvaluationPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: ServerState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %uuid::Uuid::new_v4(),
                method = %req.method(),
                path = %req.uri().path(),
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/api/reading/generate", post(handlers::generate_reading))
        .route("/api/listening/generate", post(handlers::generate_listening))
        .route("/api/reading/evaluate", post(handlers::evaluate_reading))
        .route("/api/listening/evaluate", post(handlers::evaluate_listening))
        .route("/api/writing/evaluate", post(handlers::evaluate_writing))
        .route("/api/speaking/evaluate", post(handlers::evaluate_speaking))
        .route(
            "/api/speaking/transcribe",
            post(handlers::transcribe_speech).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(trace)
        .with_state(state)
}
