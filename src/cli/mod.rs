//! CLI module for MockLLM server functionality.
//!
//! This module provides the `mockllm start` command implementation.

mod config;
mod handlers;
mod state;

pub use config::{LogFormat, ServerConfig, RESPONSES_FILE_ENV};
pub use handlers::{AppError, ErrorBody};
pub use state::AppState;

use crate::store::ResponseStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the HTTP router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route("/v1/messages", post(handlers::messages))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the MockLLM server with the given configuration
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Using responses file: {}", config.responses_file.display());
    let store = ResponseStore::open(&config.responses_file).await?;
    run_server_with_store(config, Arc::new(store)).await
}

/// Run the MockLLM server over an already loaded store
pub async fn run_server_with_store(
    config: ServerConfig,
    store: Arc<ResponseStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = store.snapshot();
    tracing::info!("Starting server on {}", config.bind_address());
    tracing::info!(
        "Configuration: responses={}, lag_enabled={}, lag_factor={}",
        snapshot.len(),
        snapshot.lag().enabled,
        snapshot.lag().factor
    );
    tracing::info!("OpenAI endpoint: /v1/chat/completions");
    tracing::info!("Anthropic endpoint: /v1/messages");

    let app = router(Arc::new(AppState::new(store)));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
