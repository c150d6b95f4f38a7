//! Response store: the prompt to answer lookup table.
//!
//! The table is loaded from a YAML file and checked for changes on every
//! lookup. A reload builds a fresh [`ResponseSnapshot`] and swaps it in whole,
//! so a reader always sees one consistent snapshot even while another task
//! reloads.
//!
//! ```yaml
//! responses:
//!   "what colour is the sky?": "The sky is blue."
//! defaults:
//!   unknown_response: "I don't know the answer to that."
//! settings:
//!   lag_enabled: true
//!   lag_factor: 10
//! ```

use crate::errors::ConfigError;
use crate::latency::{LagProfile, DEFAULT_LAG_FACTOR};
use async_stream::stream;
use futures::Stream;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;
use tokio::time::sleep;

/// Answer used when the file has no `defaults.unknown_response`
pub const DEFAULT_UNKNOWN_RESPONSE: &str = "I don't know the answer to that.";

/// A lazily produced sequence of answer chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// On-disk layout of a responses file
#[derive(Debug, Deserialize)]
struct ResponsesFile {
    responses: BTreeMap<String, String>,
    #[serde(default)]
    defaults: DefaultsSection,
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsSection {
    unknown_response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SettingsSection {
    #[serde(default)]
    lag_enabled: bool,
    #[serde(default = "default_lag_factor")]
    lag_factor: f64,
    #[serde(default)]
    chunk_size: Option<NonZeroUsize>,
}

fn default_lag_factor() -> f64 {
    DEFAULT_LAG_FACTOR
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            lag_enabled: false,
            lag_factor: default_lag_factor(),
            chunk_size: None,
        }
    }
}

/// Normalize a prompt for lookup: surrounding whitespace trimmed, lowercased
pub fn normalize_prompt(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

/// One fully loaded, immutable responses configuration
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    responses: HashMap<String, String>,
    default_answer: String,
    lag: LagProfile,
    chunk_size: Option<NonZeroUsize>,
    source_mtime: Option<SystemTime>,
}

impl ResponseSnapshot {
    /// Parse a snapshot from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, source_mtime: Option<SystemTime>) -> Result<Self, ConfigError> {
        let file: ResponsesFile = serde_yaml::from_str(yaml)?;

        let factor = file.settings.lag_factor;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "'settings.lag_factor' must be a positive number, got {}",
                factor
            )));
        }

        let mut responses = HashMap::with_capacity(file.responses.len());
        for (key, answer) in file.responses {
            let normalized = normalize_prompt(&key);
            if responses.contains_key(&normalized) {
                tracing::warn!(key = %key, "Duplicate prompt after normalization, keeping first");
                continue;
            }
            responses.insert(normalized, answer);
        }

        Ok(Self {
            responses,
            default_answer: file
                .defaults
                .unknown_response
                .unwrap_or_else(|| DEFAULT_UNKNOWN_RESPONSE.to_string()),
            lag: LagProfile::new(file.settings.lag_enabled, factor),
            chunk_size: file.settings.chunk_size,
            source_mtime,
        })
    }

    /// Look up the answer for a prompt, falling back to the default answer
    pub fn lookup(&self, prompt: &str) -> &str {
        self.responses
            .get(&normalize_prompt(prompt))
            .map(String::as_str)
            .unwrap_or(&self.default_answer)
    }

    /// Whether the prompt has a configured answer
    pub fn contains(&self, prompt: &str) -> bool {
        self.responses.contains_key(&normalize_prompt(prompt))
    }

    /// Number of configured prompts
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn default_answer(&self) -> &str {
        &self.default_answer
    }

    pub fn lag(&self) -> LagProfile {
        self.lag
    }

    /// Chunk size the protocol adapters stream with (`None` = per character)
    pub fn chunk_size(&self) -> Option<NonZeroUsize> {
        self.chunk_size
    }

    /// Modification time of the file this snapshot was read from
    pub fn source_mtime(&self) -> Option<SystemTime> {
        self.source_mtime
    }
}

/// Shared, hot-reloading holder of the current [`ResponseSnapshot`]
#[derive(Debug)]
pub struct ResponseStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<ResponseSnapshot>>,
}

impl ResponseStore {
    /// Load the responses file at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let mtime = modified_time(&path).await?;
        let snapshot = read_snapshot(&path, mtime).await?;

        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// In-memory store without a backing file; reload checks are no-ops
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_snapshot(ResponseSnapshot::from_yaml(yaml)?))
    }

    pub fn from_snapshot(snapshot: ResponseSnapshot) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<ResponseSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, snapshot: ResponseSnapshot) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // A slower concurrent reload must not roll back a newer snapshot
        if current.source_mtime > snapshot.source_mtime {
            return;
        }
        *current = Arc::new(snapshot);
    }

    /// Reload the backing file if its modification time is newer than the
    /// current snapshot's. Returns whether a reload happened.
    pub async fn reload_if_changed(&self) -> Result<bool, ConfigError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };

        let mtime = modified_time(path).await?;
        if self
            .snapshot()
            .source_mtime
            .is_some_and(|stored| mtime <= stored)
        {
            return Ok(false);
        }

        let snapshot = read_snapshot(path, mtime).await?;
        self.replace(snapshot);
        Ok(true)
    }

    async fn resolve_snapshot(
        &self,
        prompt: &str,
    ) -> Result<(Arc<ResponseSnapshot>, String), ConfigError> {
        self.reload_if_changed().await?;
        let snapshot = self.snapshot();
        let answer = snapshot.lookup(prompt).to_string();
        tracing::debug!(matched = snapshot.contains(prompt), "Resolved prompt");
        Ok((snapshot, answer))
    }

    /// Resolve a prompt to its answer, reloading the file first if it changed
    pub async fn resolve(&self, prompt: &str) -> Result<String, ConfigError> {
        let (_, answer) = self.resolve_snapshot(prompt).await?;
        Ok(answer)
    }

    /// Resolve a prompt, then wait for the simulated thinking time
    pub async fn resolve_with_lag(&self, prompt: &str) -> Result<String, ConfigError> {
        let (snapshot, answer) = self.resolve_snapshot(prompt).await?;
        let delay = snapshot.lag.response_delay(answer.chars().count());
        if !delay.is_zero() {
            sleep(delay).await;
        }
        Ok(answer)
    }

    /// Split the resolved answer into `chunk_size`-character pieces, or single
    /// characters when `chunk_size` is `None`
    pub async fn stream_chunks(
        &self,
        prompt: &str,
        chunk_size: Option<NonZeroUsize>,
    ) -> Result<Chunks, ConfigError> {
        let answer = self.resolve(prompt).await?;
        Ok(Chunks::new(answer, chunk_size))
    }

    /// Like [`stream_chunks`](Self::stream_chunks), but each chunk is preceded
    /// by a simulated typing delay. The answer is resolved before the stream is
    /// returned, so configuration errors surface here rather than mid-stream.
    pub async fn stream_chunks_with_lag(
        &self,
        prompt: &str,
        chunk_size: Option<NonZeroUsize>,
    ) -> Result<ChunkStream, ConfigError> {
        let (snapshot, answer) = self.resolve_snapshot(prompt).await?;
        Ok(lagged_chunks(snapshot.lag, Chunks::new(answer, chunk_size)))
    }

    /// Lagged chunk stream using the chunk size configured in the responses
    /// file (`settings.chunk_size`)
    pub async fn stream_answer(&self, prompt: &str) -> Result<ChunkStream, ConfigError> {
        let (snapshot, answer) = self.resolve_snapshot(prompt).await?;
        Ok(lagged_chunks(
            snapshot.lag,
            Chunks::new(answer, snapshot.chunk_size),
        ))
    }
}

fn lagged_chunks(lag: LagProfile, chunks: Chunks) -> ChunkStream {
    let char_mode = chunks.is_char_mode();

    Box::pin(stream! {
        for chunk in chunks {
            let delay = if char_mode {
                lag.char_delay()
            } else {
                lag.chunk_delay(chunk.chars().count())
            };
            if !delay.is_zero() {
                sleep(delay).await;
            }
            yield chunk;
        }
    })
}

async fn modified_time(path: &Path) -> Result<SystemTime, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
    metadata.modified().map_err(io_error)
}

async fn read_snapshot(path: &Path, mtime: SystemTime) -> Result<ResponseSnapshot, ConfigError> {
    let result = match tokio::fs::read_to_string(path).await {
        Ok(content) => ResponseSnapshot::parse(&content, Some(mtime)),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    };

    match &result {
        Ok(snapshot) => tracing::info!(
            "Loaded {} responses from {}",
            snapshot.len(),
            path.display()
        ),
        Err(e) => tracing::error!("Error loading responses: {}", e),
    }
    result
}

/// Iterator over fixed-size character chunks of an answer
#[derive(Debug, Clone)]
pub struct Chunks {
    text: String,
    pos: usize,
    size: Option<NonZeroUsize>,
}

impl Chunks {
    pub fn new(text: String, size: Option<NonZeroUsize>) -> Self {
        Self { text, pos: 0, size }
    }

    /// Whether chunks are single characters
    pub fn is_char_mode(&self) -> bool {
        self.size.is_none()
    }
}

impl Iterator for Chunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            return None;
        }

        let size = self.size.map_or(1, NonZeroUsize::get);
        let end = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(index, _)| index);
        self.pos += end;
        Some(rest[..end].to_string())
    }
}
