//! TOML Configuration File Support
//!
//! Centralized configuration loading for the chat engine, supporting a TOML
//! file at `~/.config/chat-engine/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [service]
//! endpoint = "http://localhost/answer"
//! timeout_ms = 30000
//! compression = "gzip"
//!
//! [typing]
//! instant_threshold_ms = 10
//! instant_delay_ms = 1
//! default_delay_ms = 25
//! tiers = [{ max_chars = 40, delay_ms = 10 }, { max_chars = 200, delay_ms = 18 }]
//!
//! [messages]
//! failure_message = "Failed to fetch the answer or no matching answers found. Please try again."
//! no_answer_text = "No answer available"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{PayloadCompression, DEFAULT_ENDPOINT, NO_ANSWER_TEXT};
use crate::typing::{default_tiers, PaceTier, TieredPace};

/// Message shown when the answer service call fails
pub const DEFAULT_FAILURE_MESSAGE: &str =
    "Failed to fetch the answer or no matching answers found. Please try again.";

// =============================================================================
// Error Types
// =============================================================================

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// Config file path
        path: PathBuf,
        /// IO failure
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("malformed config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is out of range or malformed
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Highest-priority layer that contributed a value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line flag
    Cli,
    /// `CHAT_*` environment variable
    Env,
    /// The TOML file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Service section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceToml {
    /// Answer endpoint URL
    pub endpoint: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: Option<u64>,

    /// Payload compression ("gzip" or "none")
    pub compression: Option<PayloadCompression>,
}

/// Typing section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingToml {
    /// Latency in milliseconds at or below which reveals are near-instant
    pub instant_threshold_ms: Option<u64>,

    /// Per-character delay for near-instant reveals
    pub instant_delay_ms: Option<u64>,

    /// Per-character delay for answers longer than every tier
    pub default_delay_ms: Option<u64>,

    /// Length tiers
    pub tiers: Option<Vec<PaceTier>>,
}

/// Messages section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesToml {
    /// Text of the error turn shown when the service call fails
    pub failure_message: Option<String>,

    /// Text revealed when the service has no usable answer
    pub no_answer_text: Option<String>,
}

/// Whole config file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Service configuration section
    pub service: ServiceToml,

    /// Typing configuration section
    pub typing: TypingToml,

    /// Messages configuration section
    pub messages: MessagesToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Answer service settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Answer endpoint URL
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Payload compression
    pub compression: PayloadCompression,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            compression: PayloadCompression::Gzip,
        }
    }
}

/// Reveal pacing settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypingConfig {
    /// Latency at or below which reveals are near-instant
    pub instant_threshold: Duration,
    /// Per-character delay for near-instant reveals
    pub instant_delay: Duration,
    /// Per-character delay for answers longer than every tier
    pub default_delay: Duration,
    /// Length tiers
    pub tiers: Vec<PaceTier>,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            instant_threshold: Duration::from_millis(10),
            instant_delay: Duration::from_millis(1),
            default_delay: Duration::from_millis(25),
            tiers: default_tiers(),
        }
    }
}

impl TypingConfig {
    /// Build the pace function described by these settings
    #[must_use]
    pub fn pace(&self) -> TieredPace {
        TieredPace::new(
            self.instant_threshold,
            self.instant_delay,
            self.tiers.clone(),
            self.default_delay,
        )
    }
}

/// Centralized configuration for the chat engine
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Answer service settings
    pub service: ServiceConfig,

    /// Reveal pacing settings
    pub typing: TypingConfig,

    /// Text of the error turn shown when the service call fails
    pub failure_message: String,

    /// Text revealed when the service has no usable answer
    pub no_answer_text: String,

    /// File the values were read from, if one existed
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            typing: TypingConfig::default(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            no_answer_text: NO_ANSWER_TEXT.to_string(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ChatConfig {
    /// Defaults only
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest-priority layer that set a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check values that cannot be expressed by the types alone
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a non-HTTP endpoint or a
    /// zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.service.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "endpoint must be an http(s) URL, got {endpoint:?}"
            )));
        }
        if self.service.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Default config file location
///
/// Returns `$XDG_CONFIG_HOME/chat-engine/config.toml` or
/// `~/.config/chat-engine/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chat-engine").join("config.toml"))
}

/// Load the default config file, then the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<ChatConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load `path` (if it exists), then the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ChatConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `env` to look up environment variables
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<ChatConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Start with defaults
    let mut config = ChatConfig::default();

    // Try to load from file
    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ChatToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Config file loaded"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "No config file"
            );
        }
    }

    apply_env_config(&mut config, env)?;

    config.validate()?;
    Ok(config)
}

/// Copy every value present in the file
fn apply_toml_config(config: &mut ChatConfig, toml: &ChatToml) {
    if let Some(ref endpoint) = toml.service.endpoint {
        config.service.endpoint = endpoint.clone();
    }
    if let Some(ms) = toml.service.timeout_ms {
        config.service.timeout = Duration::from_millis(ms);
    }
    if let Some(compression) = toml.service.compression {
        config.service.compression = compression;
    }

    if let Some(ms) = toml.typing.instant_threshold_ms {
        config.typing.instant_threshold = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.typing.instant_delay_ms {
        config.typing.instant_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.typing.default_delay_ms {
        config.typing.default_delay = Duration::from_millis(ms);
    }
    if let Some(ref tiers) = toml.typing.tiers {
        config.typing.tiers = tiers.clone();
    }

    if let Some(ref message) = toml.messages.failure_message {
        config.failure_message = message.clone();
    }
    if let Some(ref text) = toml.messages.no_answer_text {
        config.no_answer_text = text.clone();
    }
}

/// Copy every `CHAT_*` variable that is set
fn apply_env_config<F>(config: &mut ChatConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = env("CHAT_ENDPOINT") {
        config.service.endpoint = endpoint;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("CHAT_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.service.timeout = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(compression) = env("CHAT_COMPRESSION") {
        config.service.compression = parse_compression(&compression)?;
        config.source = ConfigSource::Env;
    }
    if let Some(delay) = env("CHAT_TYPING_DELAY_MS") {
        if let Ok(ms) = delay.parse::<u64>() {
            config.typing.default_delay = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(message) = env("CHAT_FAILURE_MESSAGE") {
        config.failure_message = message;
        config.source = ConfigSource::Env;
    }
    Ok(())
}

/// Parse a compression name as used by the environment and the CLI
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] for an unknown name.
pub fn parse_compression(value: &str) -> Result<PayloadCompression, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "gzip" => Ok(PayloadCompression::Gzip),
        "none" | "off" => Ok(PayloadCompression::None),
        other => Err(ConfigError::ValidationError(format!(
            "unknown compression {other:?} (expected \"gzip\" or \"none\")"
        ))),
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line values, applied on top of [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint override
    pub endpoint: Option<String>,

    /// Timeout override (milliseconds)
    pub timeout_ms: Option<u64>,

    /// Compression override
    pub compression: Option<PayloadCompression>,
}

impl ConfigOverrides {
    /// No overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Set compression override
    #[must_use]
    pub fn with_compression(mut self, compression: PayloadCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Write the overrides into `config` and validate the result
    ///
    /// # Errors
    ///
    /// Returns an error if the overridden configuration is invalid.
    pub fn apply(&self, config: &mut ChatConfig) -> Result<(), ConfigError> {
        if self.endpoint.is_some() || self.timeout_ms.is_some() || self.compression.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref endpoint) = self.endpoint {
            config.service.endpoint = endpoint.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.service.timeout = Duration::from_millis(ms);
        }
        if let Some(compression) = self.compression {
            config.service.compression = compression;
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
