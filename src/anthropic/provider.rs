// Anthropic Provider Module
// Answers Messages API requests and frames them as content-delta streams.

use super::types::{new_message_id, MessagesRequest, MessagesResponse, Role, StreamEvent};
use crate::provider::{serialize_messages, ChatRequest, Provider};
use crate::store::{ChunkStream, ResponseStore};
use crate::stream::{format_sse, SseStream, DONE_MARKER};
use crate::tokens::TokenUsage;
use async_stream::stream;
use futures::StreamExt;
use std::sync::Arc;

impl ChatRequest for MessagesRequest {
    fn model(&self) -> &str {
        &self.model
    }

    fn is_stream(&self) -> bool {
        self.stream
    }

    fn last_user_message(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.to_text())
    }

    fn prompt_text(&self) -> String {
        serialize_messages(&self.messages)
    }
}

/// `/v1/messages` adapter
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    store: Arc<ResponseStore>,
}

impl AnthropicProvider {
    pub fn new(store: Arc<ResponseStore>) -> Self {
        Self { store }
    }
}

impl Provider for AnthropicProvider {
    type Request = MessagesRequest;
    type Response = MessagesResponse;

    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn store(&self) -> &ResponseStore {
        &self.store
    }

    fn render_response(
        &self,
        request: &MessagesRequest,
        content: String,
        usage: TokenUsage,
    ) -> MessagesResponse {
        MessagesResponse::new(request.model.clone(), content, usage.into())
    }

    // No role or stop frame: every chunk is a content delta
    fn render_stream(&self, _model: String, mut chunks: ChunkStream) -> SseStream {
        let id = new_message_id();

        Box::pin(stream! {
            while let Some(text) = chunks.next().await {
                yield format_sse(&StreamEvent::text_delta(id.clone(), text));
            }
            yield DONE_MARKER.to_string();
        })
    }
}
