//! The `bandcoach serve` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use bandcoach_core::traits::ModelInvoker;
use bandcoach_core::EvaluationPipeline;
use bandcoach_providers::{create_invoker, API_KEY_ENV};
use bandcoach_server::{build_router, ServerState};

pub async fn execute(bind: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = bandcoach_providers::load_config_from(config_path.as_deref())?;

    if !config.has_credential() {
        tracing::warn!(
            "OpenAI API key is not configured; set {API_KEY_ENV} or [openai].api_key. \
             Every request will fail until then."
        );
    }

    let invoker: Arc<dyn ModelInvoker> = Arc::from(create_invoker(&config)?);
    let pipeline = EvaluationPipeline::new(invoker, config.pipeline_config());
    let router = build_router(ServerState::new(pipeline));

    let addr = bind.unwrap_or_else(|| config.bind.clone());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(model = %config.model, "bandcoach listening on http://{addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
