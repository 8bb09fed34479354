//! Configuration management for mosaicsh
//!
//! The configuration model, its validation rules, and the file
//! [`loader`] that finds and reads it.

pub mod loader;

pub use loader::{ConfigFormat, ConfigLoader, LoadOptions};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Default prompt text
pub const DEFAULT_PROMPT: &str = "%";
/// Default number of remembered commands
pub const DEFAULT_HISTORY_SIZE: usize = 10;
/// Default retained output per foreground command
pub const DEFAULT_CAPTURE_LIMIT: usize = 1024 * 1024;
/// Default number of reaped records kept around
pub const DEFAULT_RETIRED_CAPACITY: usize = 64;

/// Main configuration structure for mosaicsh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interactive shell settings
    pub shell: ShellConfig,

    /// Process execution settings
    pub execution: ExecutionConfig,

    /// Job table settings
    pub jobs: JobsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Interactive shell settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Prompt text; `{cwd}` is replaced by the working directory
    pub prompt: String,

    /// Number of commands kept in history
    pub history_size: usize,

    /// Optional file the history is loaded from and appended to
    pub history_file: Option<PathBuf>,

    /// Maximum number of words in one pipeline stage
    pub max_tokens: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history_size: DEFAULT_HISTORY_SIZE,
            history_file: None,
            max_tokens: crate::commands::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Process execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Collect the stdout of foreground single commands
    pub capture_foreground_output: bool,

    /// Bytes of captured output to retain
    pub capture_limit_bytes: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            capture_foreground_output: true,
            capture_limit_bytes: DEFAULT_CAPTURE_LIMIT,
        }
    }
}

/// Job table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Reaped records kept for reporting before the oldest is dropped
    pub retired_capacity: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            retired_capacity: DEFAULT_RETIRED_CAPACITY,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid history size: {0} (must be between 1 and 100000)")]
    InvalidHistorySize(usize),

    #[error("Invalid token limit: {0} (must be between 1 and 65536)")]
    InvalidMaxTokens(usize),

    #[error("Invalid capture limit: {0} (maximum 64MB)")]
    InvalidCaptureLimit(usize),

    #[error("Invalid retired job capacity: {0} (maximum 100000)")]
    InvalidRetiredCapacity(usize),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Prompt cannot be empty")]
    EmptyPrompt,
}

impl ConfigError {
    /// Dotted name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::InvalidHistorySize(_) => "shell.history_size",
            ConfigError::InvalidMaxTokens(_) => "shell.max_tokens",
            ConfigError::InvalidCaptureLimit(_) => "execution.capture_limit_bytes",
            ConfigError::InvalidRetiredCapacity(_) => "jobs.retired_capacity",
            ConfigError::InvalidLogLevel(_) => "logging.level",
            ConfigError::EmptyPrompt => "shell.prompt",
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        crate::error::Error::ConfigValidationFailed {
            field: err.field().to_string(),
            reason: err.to_string(),
        }
    }
}

impl Config {
    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shell.history_size == 0 || self.shell.history_size > 100_000 {
            return Err(ConfigError::InvalidHistorySize(self.shell.history_size));
        }
        if self.shell.max_tokens == 0 || self.shell.max_tokens > 65_536 {
            return Err(ConfigError::InvalidMaxTokens(self.shell.max_tokens));
        }
        if self.shell.prompt.trim().is_empty() {
            return Err(ConfigError::EmptyPrompt);
        }
        if self.execution.capture_limit_bytes > 64 * 1024 * 1024 {
            return Err(ConfigError::InvalidCaptureLimit(
                self.execution.capture_limit_bytes,
            ));
        }
        if self.jobs.retired_capacity > 100_000 {
            return Err(ConfigError::InvalidRetiredCapacity(
                self.jobs.retired_capacity,
            ));
        }
        self.log_level()?;
        Ok(())
    }

    /// Parsed `logging.level`
    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        self.logging
            .level
            .parse::<LevelFilter>()
            .map_err(|_| ConfigError::InvalidLogLevel(self.logging.level.clone()))
    }
}
