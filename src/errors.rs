// Error Types Module
// Failures raised while loading responses and while handling chat requests.

use std::path::PathBuf;

/// Responses file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read responses file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse responses file: {0}")]
    Parse(String),
    #[error("Invalid responses file: {0}")]
    Validation(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Errors surfaced by a protocol adapter while handling a chat request
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The conversation carries no user-role message to answer
    #[error("No user message found in request")]
    NoUserMessage,
    /// The responses table could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ProviderError::NoUserMessage => 400,
            ProviderError::Config(_) => 500,
        }
    }

    /// Whether the client, rather than the server, is at fault
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
