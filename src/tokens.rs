// Token Counter Module
// Uses tiktoken-rs for OpenAI-compatible token counts, falling back to a
// whitespace word count for models without a known encoding.

use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, o200k_base, p50k_base, r50k_base, CoreBPE};

/// BPE encodings known to the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    O200kBase,
    Cl100kBase,
    P50kBase,
    R50kBase,
}

/// Exact model names, matching OpenAI's tokenizer registry
const MODEL_TO_ENCODING: &[(&str, Encoding)] = &[
    // o200k_base: GPT-5, GPT-4.x, GPT-4o, O-series
    ("gpt-5", Encoding::O200kBase),
    ("gpt-4.1", Encoding::O200kBase),
    ("gpt-4o", Encoding::O200kBase),
    ("o1", Encoding::O200kBase),
    ("o3", Encoding::O200kBase),
    ("o4-mini", Encoding::O200kBase),
    // cl100k_base: GPT-4, GPT-3.5, embeddings
    ("gpt-4", Encoding::Cl100kBase),
    ("gpt-3.5-turbo", Encoding::Cl100kBase),
    ("gpt-3.5", Encoding::Cl100kBase),
    ("gpt-35-turbo", Encoding::Cl100kBase),
    ("davinci-002", Encoding::Cl100kBase),
    ("babbage-002", Encoding::Cl100kBase),
    ("text-embedding-ada-002", Encoding::Cl100kBase),
    ("text-embedding-3-small", Encoding::Cl100kBase),
    ("text-embedding-3-large", Encoding::Cl100kBase),
    // p50k_base: text-davinci-002/003, codex
    ("text-davinci-003", Encoding::P50kBase),
    ("text-davinci-002", Encoding::P50kBase),
    ("text-davinci-edit-001", Encoding::P50kBase),
    ("code-davinci-002", Encoding::P50kBase),
    ("code-davinci-001", Encoding::P50kBase),
    ("code-davinci-edit-001", Encoding::P50kBase),
    ("code-cushman-002", Encoding::P50kBase),
    ("code-cushman-001", Encoding::P50kBase),
    ("davinci-codex", Encoding::P50kBase),
    ("cushman-codex", Encoding::P50kBase),
    // r50k_base: GPT-3
    ("text-davinci-001", Encoding::R50kBase),
    ("text-curie-001", Encoding::R50kBase),
    ("text-babbage-001", Encoding::R50kBase),
    ("text-ada-001", Encoding::R50kBase),
    ("davinci", Encoding::R50kBase),
    ("curie", Encoding::R50kBase),
    ("babbage", Encoding::R50kBase),
    ("ada", Encoding::R50kBase),
];

/// Versioned model names (e.g. "gpt-4o-2024-08-06")
const MODEL_PREFIX_TO_ENCODING: &[(&str, Encoding)] = &[
    ("o1-", Encoding::O200kBase),
    ("o3-", Encoding::O200kBase),
    ("o4-mini-", Encoding::O200kBase),
    ("gpt-5-", Encoding::O200kBase),
    ("gpt-4.5-", Encoding::O200kBase),
    ("gpt-4.1-", Encoding::O200kBase),
    ("chatgpt-4o-", Encoding::O200kBase),
    ("gpt-4o-", Encoding::O200kBase),
    ("gpt-4-", Encoding::Cl100kBase),
    ("gpt-3.5-turbo-", Encoding::Cl100kBase),
    ("gpt-35-turbo-", Encoding::Cl100kBase),
];

impl Encoding {
    /// Get the encoding for a model, or `None` if the model is unrecognized
    pub fn for_model(model: &str) -> Option<Self> {
        let model = model.trim().to_lowercase();

        MODEL_TO_ENCODING
            .iter()
            .find(|(name, _)| *name == model)
            .or_else(|| {
                MODEL_PREFIX_TO_ENCODING
                    .iter()
                    .find(|(prefix, _)| model.starts_with(prefix))
            })
            .map(|(_, encoding)| *encoding)
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::O200kBase => "o200k_base",
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::R50kBase => "r50k_base",
        }
    }

    /// The process-wide tokenizer for this encoding, built on first use
    fn bpe(self) -> Option<&'static CoreBPE> {
        static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();
        static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
        static P50K: OnceLock<Option<CoreBPE>> = OnceLock::new();
        static R50K: OnceLock<Option<CoreBPE>> = OnceLock::new();

        let cell = match self {
            Encoding::O200kBase => &O200K,
            Encoding::Cl100kBase => &CL100K,
            Encoding::P50kBase => &P50K,
            Encoding::R50kBase => &R50K,
        };
        cell.get_or_init(|| self.load()).as_ref()
    }

    fn load(self) -> Option<CoreBPE> {
        let result = match self {
            Encoding::O200kBase => o200k_base(),
            Encoding::Cl100kBase => cl100k_base(),
            Encoding::P50kBase => p50k_base(),
            Encoding::R50kBase => r50k_base(),
        };

        match result {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(encoding = self.name(), "Failed to initialize tokenizer: {}", e);
                None
            }
        }
    }
}

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Count tokens in a text string for a specific model
///
/// Never fails: models without a known encoding (including every non-OpenAI
/// model) are estimated by word count instead.
pub fn count_tokens(text: &str, model: &str) -> usize {
    match Encoding::for_model(model).and_then(Encoding::bpe) {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => count_words(text),
    }
}

/// Protocol-independent token usage for one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl TokenUsage {
    pub fn new(prompt: usize, completion: usize) -> Self {
        let prompt = u32::try_from(prompt).unwrap_or(u32::MAX);
        let completion = u32::try_from(completion).unwrap_or(u32::MAX);
        Self {
            prompt,
            completion,
            total: prompt.saturating_add(completion),
        }
    }

    /// Measure usage for a serialized prompt and its completion
    pub fn measure(prompt_text: &str, completion_text: &str, model: &str) -> Self {
        Self::new(
            count_tokens(prompt_text, model),
            count_tokens(completion_text, model),
        )
    }
}
