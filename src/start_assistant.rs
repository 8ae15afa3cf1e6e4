//! Startup helpers for the assistant server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::config::{AnswerBackend, AssistantConfig};
use crate::server::{self, AppState};

/// Run the server until Ctrl-C (used by the `wikikisan-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting WikiKisan assistant v{}", env!("CARGO_PKG_VERSION"));

    let (config, state) = match initialize() {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!("Failed to initialize: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(
        state,
        config.port,
        shutdown_signal(),
    )) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Load configuration from the environment and build application state.
///
/// # Errors
/// Returns an error if configuration is invalid or state creation fails.
pub fn initialize()
-> Result<(AssistantConfig, Arc<AppState>), Box<dyn std::error::Error + Send + Sync>> {
    let config = AssistantConfig::from_env()?;

    match config.answers.backend {
        AnswerBackend::Canned => tracing::info!("Answer backend: canned"),
        AnswerBackend::Ollama => tracing::info!(
            "Answer backend: ollama at {} (model {})",
            config.answers.ollama.base_url,
            config.answers.ollama.model
        ),
    }

    let state = AppState::from_config(&config)
        .map_err(|e| format!("Failed to create state: {e}"))?;

    Ok((config, state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
