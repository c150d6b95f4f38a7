// Application State Module

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;
use crate::store::ResponseStore;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub store: Arc<ResponseStore>,
    pub openai: OpenAiProvider,
    pub anthropic: AnthropicProvider,
}

impl AppState {
    pub fn new(store: Arc<ResponseStore>) -> Self {
        Self {
            openai: OpenAiProvider::new(store.clone()),
            anthropic: AnthropicProvider::new(store.clone()),
            store,
        }
    }
}
