//! MockLLM CLI - canned-answer LLM API server
//!
//! Usage:
//!   mockllm start [OPTIONS]     Start the HTTP server
//!   mockllm validate <PATH>     Check a responses file
//!
//! Examples:
//!   mockllm start --responses responses.yml --port 8000
//!   MOCKLLM_RESPONSES_FILE=answers.yml mockllm start --log-format text
//!   mockllm validate responses.yml

use clap::{Parser, Subcommand};
use mockllm::cli::{LogFormat, ServerConfig, RESPONSES_FILE_ENV};
use mockllm::store::ResponseStore;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "mockllm=info,tower_http=debug";

#[derive(Parser)]
#[command(name = "mockllm")]
#[command(author, version, about = "Mock LLM API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MockLLM HTTP server
    Start {
        /// Responses file path (YAML)
        #[arg(short, long, env = RESPONSES_FILE_ENV, default_value = "responses.yml")]
        responses: PathBuf,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Log output format
        #[arg(long, value_enum, default_value_t = LogFormat::Json)]
        log_format: LogFormat,
    },
    /// Validate a responses file without starting the server
    Validate {
        /// Responses file path (YAML)
        path: PathBuf,
    },
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn validate(path: PathBuf) -> ExitCode {
    match ResponseStore::open(&path).await {
        Ok(store) => {
            println!("✓ Valid responses file");
            println!("Found {} responses", store.snapshot().len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✗ Invalid responses file");
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            responses,
            host,
            port,
            log_format,
        } => {
            init_tracing(log_format);

            let config = ServerConfig {
                host,
                port,
                responses_file: responses,
            };
            mockllm::cli::run_server(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { path } => Ok(validate(path).await),
    }
}
