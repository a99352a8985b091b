//! Chat Term - Line-Oriented Chat Surface
//!
//! Reads questions from stdin, sends them to the answer service and types the
//! answers back out on stdout. Logs go to stderr so the transcript stays
//! clean.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (config file, then environment)
//! chat-term
//!
//! # Custom endpoint, uncompressed payloads
//! chat-term --endpoint https://answers.example.com/answer --compression none
//!
//! # Verbose logging
//! RUST_LOG=debug chat-term
//! ```
//!
//! # Commands
//!
//! - `/stop` (or an empty line while an answer is being typed): stop typing
//! - `/quit`: exit

mod app;
mod input;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use chat_core::backend::{AnswerBackend, HttpAnswerBackend, PayloadCompression};
use chat_core::config::{load_config, load_config_from_path, parse_compression, ConfigOverrides};
use chat_core::{ControllerConfig, TurnController};

use app::{spawn_stdin_reader, App};

/// Engine message channel capacity
const ENGINE_BUFFER: usize = 1024;

/// Chat Term - ask questions, watch the answers being typed
#[derive(Parser, Debug)]
#[command(name = "chat-term")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Answer service endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Request payload compression (gzip or none)
    #[arg(long, value_name = "MODE", value_parser = parse_compression_arg)]
    compression: Option<PayloadCompression>,

    /// Request timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "CHAT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn parse_compression_arg(value: &str) -> Result<PayloadCompression, String> {
    parse_compression(value).map_err(|e| e.to_string())
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("chat_term={level},chat_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = match args.config {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(endpoint) = args.endpoint {
        overrides = overrides.with_endpoint(endpoint);
    }
    if let Some(ms) = args.timeout_ms {
        overrides = overrides.with_timeout_ms(ms);
    }
    if let Some(compression) = args.compression {
        overrides = overrides.with_compression(compression);
    }
    overrides
        .apply(&mut config)
        .context("Invalid command-line options")?;

    info!(
        endpoint = %config.service.endpoint,
        compression = ?config.service.compression,
        source = %config.source(),
        "Starting chat-term"
    );

    let backend = HttpAnswerBackend::from_config(&config.service, &config.no_answer_text)
        .context("Failed to create answer service client")?;
    if !backend.health_check().await {
        warn!(
            endpoint = %config.service.endpoint,
            "Answer service is not reachable, questions will fail until it is"
        );
    }

    let (tx, engine_rx) = mpsc::channel(ENGINE_BUFFER);
    let controller = TurnController::new(backend, ControllerConfig::from(&config), tx)
        .with_pace(config.typing.pace());

    println!("Type a question. /stop interrupts an answer, /quit exits.");

    let mut app = App::new(controller, engine_rx);
    let mut stdout = tokio::io::stdout();
    app.run(spawn_stdin_reader(16), &mut stdout).await?;

    info!("Shutdown complete");
    Ok(())
}
