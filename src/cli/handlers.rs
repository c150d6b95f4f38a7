// HTTP Handlers Module
// Implements the OpenAI-compatible and Anthropic-compatible chat endpoints.

use super::state::AppState;
use crate::{
    anthropic::MessagesRequest,
    errors::ProviderError,
    openai::ChatCompletionRequest,
    provider::{Completion, Provider},
    stream::EVENT_STREAM_CONTENT_TYPE,
};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mockllm",
        "responses": state.store.snapshot().len(),
    }))
}

/// POST /v1/chat/completions
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Response, AppError> {
    tracing::info!(
        model = %request.model,
        message_count = request.messages.len(),
        stream = request.stream,
        "Received chat completion request"
    );

    let completion = state.openai.handle(request).await?;
    Ok(completion_response(completion))
}

/// POST /v1/messages
pub async fn messages(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessagesRequest>,
) -> Result<Response, AppError> {
    tracing::info!(
        model = %request.model,
        message_count = request.messages.len(),
        stream = request.stream,
        "Received Anthropic chat completion request"
    );

    let completion = state.anthropic.handle(request).await?;
    Ok(completion_response(completion))
}

fn completion_response<R: Serialize>(completion: Completion<R>) -> Response {
    match completion {
        Completion::Full(body) => Json(body).into_response(),
        Completion::Stream(stream) => (
            [
                (header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(stream.map(Ok::<_, std::io::Error>)),
        )
            .into_response(),
    }
}

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        if err.is_client_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(format!("Internal server error: {}", err))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::BadRequest(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Error processing request: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
