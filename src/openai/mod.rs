//! OpenAI Chat Completions protocol (`POST /v1/chat/completions`).

mod provider;
mod types;

pub use provider::OpenAiProvider;
pub use types::*;
