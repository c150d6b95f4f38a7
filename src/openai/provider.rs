// OpenAI Provider Module
// Answers chat completion requests and frames them as OpenAI chunk streams.

use super::types::{
    new_completion_id, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, Role,
};
use crate::provider::{serialize_messages, ChatRequest, Provider};
use crate::store::{ChunkStream, ResponseStore};
use crate::stream::{format_sse, SseStream, DONE_MARKER};
use crate::tokens::TokenUsage;
use async_stream::stream;
use futures::StreamExt;
use std::sync::Arc;

impl ChatRequest for ChatCompletionRequest {
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
            .map(|message| message.content.clone())
    }

    fn prompt_text(&self) -> String {
        serialize_messages(&self.messages)
    }
}

/// `/v1/chat/completions` adapter
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    store: Arc<ResponseStore>,
}

impl OpenAiProvider {
    pub fn new(store: Arc<ResponseStore>) -> Self {
        Self { store }
    }
}

impl Provider for OpenAiProvider {
    type Request = ChatCompletionRequest;
    type Response = ChatCompletionResponse;

    fn name(&self) -> &'static str {
        "openai"
    }

    fn store(&self) -> &ResponseStore {
        &self.store
    }

    fn render_response(
        &self,
        request: &ChatCompletionRequest,
        content: String,
        usage: TokenUsage,
    ) -> ChatCompletionResponse {
        ChatCompletionResponse::new(request.model.clone(), content, usage.into())
    }

    fn render_stream(&self, model: String, mut chunks: ChunkStream) -> SseStream {
        let id = new_completion_id();
        let created = chrono::Utc::now().timestamp();

        Box::pin(stream! {
            // First chunk: role announcement
            yield format_sse(
                &ChatCompletionChunk::new(id.clone(), model.clone(), created).with_role(),
            );

            while let Some(text) = chunks.next().await {
                yield format_sse(
                    &ChatCompletionChunk::new(id.clone(), model.clone(), created)
                        .with_content(text),
                );
            }

            // Final chunk with finish_reason
            yield format_sse(
                &ChatCompletionChunk::new(id.clone(), model.clone(), created)
                    .with_finish("stop".to_string()),
            );

            yield DONE_MARKER.to_string();
        })
    }
}
