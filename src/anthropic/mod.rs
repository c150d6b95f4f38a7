//! Anthropic Messages protocol (`POST /v1/messages`).

mod provider;
mod types;

pub use provider::AnthropicProvider;
pub use types::*;
