// Server Configuration Module
// Network and logging settings for `mockllm start`, filled from flags and env.

use clap::ValueEnum;
use std::path::PathBuf;

/// Environment variable naming the responses file
pub const RESPONSES_FILE_ENV: &str = "MOCKLLM_RESPONSES_FILE";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub responses_file: PathBuf,
}

impl ServerConfig {
    /// Bind address as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            responses_file: PathBuf::from("responses.yml"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable text
    Text,
}
