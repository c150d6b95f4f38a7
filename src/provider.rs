//! Protocol-independent chat handling.
//!
//! Both wire protocols share the same pipeline: find the last user message,
//! resolve it against the [`ResponseStore`], then either render one response
//! body with token usage or a lagged SSE stream. Each protocol implements
//! [`Provider`] to supply only its request accessors and rendering.

use crate::errors::ProviderError;
use crate::store::{ChunkStream, ResponseStore};
use crate::stream::SseStream;
use crate::tokens::TokenUsage;
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;

/// Read access to a protocol-specific chat request
pub trait ChatRequest {
    /// Model identifier, used as the token-counting key
    fn model(&self) -> &str;

    /// Whether the client asked for an event stream
    fn is_stream(&self) -> bool;

    /// Text of the last user-role message, scanning from the end
    fn last_user_message(&self) -> Option<String>;

    /// Message list serialized for prompt-token counting
    fn prompt_text(&self) -> String;
}

/// Serialize a message list one compact JSON object per line, so the word
/// fallback of the token counter sees each message's words separately
pub fn serialize_messages<T: Serialize>(messages: &[T]) -> String {
    messages
        .iter()
        .filter_map(|message| match serde_json::to_string(message) {
            Ok(line) => Some(line),
            Err(e) => {
                tracing::warn!("Skipping unserializable message in token count: {}", e);
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read an optional boolean flag, treating an explicit `null` as `false`
pub fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Result of handling a chat request
pub enum Completion<R> {
    /// A complete response body
    Full(R),
    /// A live SSE event stream
    Stream(SseStream),
}

impl<R: std::fmt::Debug> std::fmt::Debug for Completion<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Full(response) => f.debug_tuple("Full").field(response).finish(),
            Completion::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// One wire protocol (OpenAI chat completions, Anthropic messages)
pub trait Provider: Send + Sync {
    type Request: ChatRequest + Send + Sync;
    type Response: Serialize + Send;

    /// Name for logging/debugging
    fn name(&self) -> &'static str;

    /// The store answers are resolved from
    fn store(&self) -> &ResponseStore;

    /// Build the complete response body
    fn render_response(
        &self,
        request: &Self::Request,
        content: String,
        usage: TokenUsage,
    ) -> Self::Response;

    /// Frame answer chunks as protocol SSE events, ending with the done marker
    fn render_stream(&self, model: String, chunks: ChunkStream) -> SseStream;

    /// Handle a chat request end to end
    fn handle(
        &self,
        request: Self::Request,
    ) -> impl Future<Output = Result<Completion<Self::Response>, ProviderError>> + Send
    where
        Self: Sized,
    {
        async move {
            let prompt = request
                .last_user_message()
                .ok_or(ProviderError::NoUserMessage)?;

            let store = self.store();

            if request.is_stream() {
                let chunks = store.stream_answer(&prompt).await?;
                tracing::debug!(provider = self.name(), "Streaming response");
                return Ok(Completion::Stream(
                    self.render_stream(request.model().to_string(), chunks),
                ));
            }

            let content = store.resolve_with_lag(&prompt).await?;
            let usage = TokenUsage::measure(&request.prompt_text(), &content, request.model());
            tracing::debug!(
                provider = self.name(),
                prompt_tokens = usage.prompt,
                completion_tokens = usage.completion,
                "Rendered response"
            );

            Ok(Completion::Full(self.render_response(&request, content, usage)))
        }
    }
}
