//! # MockLLM - Canned-Answer LLM API Server
//!
//! A small server that speaks the OpenAI chat-completions and Anthropic
//! messages protocols, answering from a YAML table instead of a model.
//!
//! ## Features
//!
//! - Prompt-to-answer lookup from a hot-reloadable YAML file
//! - Optional lag that scales with answer length
//! - Streaming support (Server-Sent Events) for both protocols
//! - Token usage counted with tiktoken-rs, with a word-count fallback
//!
//! ## Usage
//!
//! ### As a CLI
//!
//! ```bash
//! # Start the server
//! mockllm start --responses responses.yml --port 8000
//!
//! # Check a responses file
//! mockllm validate responses.yml
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use mockllm::store::ResponseStore;
//!
//! # async fn demo() -> Result<(), mockllm::errors::ConfigError> {
//! let store = ResponseStore::from_yaml("responses:\n  hello: hi there\n")?;
//! let answer = store.resolve("Hello").await?;
//! assert_eq!(answer, "hi there");
//!
//! let tokens = mockllm::tokens::count_tokens("Hello, world!", "gpt-4");
//! # let _ = tokens;
//! # Ok(())
//! # }
//! ```

// Core library modules
pub mod errors;
pub mod latency;
pub mod provider;
pub mod store;
pub mod stream;
pub mod tokens;

// Protocol adapters
pub mod anthropic;
pub mod openai;

// CLI module (for `mockllm start` command)
pub mod cli;

// Re-export commonly used types
pub use errors::{ConfigError, ProviderError};
pub use latency::LagProfile;
pub use provider::{ChatRequest, Completion, Provider};
pub use store::{normalize_prompt, ResponseSnapshot, ResponseStore};
pub use tokens::{count_tokens, count_words, TokenUsage};
