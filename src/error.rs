//! Error types and Result aliases for mosaicsh

use std::fmt;
use std::path::PathBuf;

/// Result type alias for mosaicsh operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mosaicsh
#[derive(Debug)]
pub enum Error {
    // === Process orchestration errors ===
    /// The process-creation primitive failed for a pipeline stage
    SpawnFailure {
        command: String,
        reason: String,
    },

    /// Inter-stage pipes could not be allocated; nothing was spawned
    PipeSetupFailure {
        reason: String,
    },

    /// Target program could not be located or executed
    ExecFailure {
        command: String,
        status: i32,
    },

    /// A redirection target could not be opened
    RedirectOpenFailure {
        path: PathBuf,
        reason: String,
    },

    /// Waiting on a child process failed
    WaitFailed {
        reason: String,
    },

    // === Parsing errors ===
    /// Argument vector capacity exceeded
    TooManyTokens {
        limit: usize,
    },

    /// Command has no program to run
    EmptyCommand,

    /// A `|` has nothing on one of its sides
    EmptyPipelineStage {
        position: usize,
    },

    /// A redirection operator is not followed by a file name
    MissingRedirectTarget {
        operator: String,
    },

    /// Redirection appears on a stage that cannot carry it
    MisplacedRedirect {
        stage: usize,
        operator: String,
    },

    /// Glob pattern could not be compiled
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    // === History errors ===
    /// No history entry starts with the requested prefix
    HistoryEventNotFound {
        prefix: String,
    },

    /// A recalled history entry is itself a recall
    RecursiveHistoryRecall {
        command: String,
    },

    // === Session errors ===
    /// `cd` could not change directory
    DirectoryChangeFailed {
        path: PathBuf,
        reason: String,
    },

    /// Terminal ownership could not be transferred
    TerminalControlFailed {
        reason: String,
    },

    /// Signal dispositions could not be installed
    SignalSetupFailed {
        signal: String,
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration file not found
    ConfigNotFound,

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    /// Failed to serialize configuration
    ConfigSerializationFailed {
        format: String,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    // === I/O and system errors ===
    /// I/O errors
    Io(std::io::Error),

    /// System call errors
    Sys(nix::errno::Errno),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Process orchestration errors
            Error::SpawnFailure { command, reason } => {
                write!(f, "{}: failed to create process: {}", command, reason)
            }
            Error::PipeSetupFailure { reason } => {
                write!(f, "failed to create pipe: {}", reason)
            }
            Error::ExecFailure { command, status } => {
                write!(f, "{}: could not execute (status {})", command, status)
            }
            Error::RedirectOpenFailure { path, reason } => {
                write!(f, "{}: {}", path.display(), reason)
            }
            Error::WaitFailed { reason } => {
                write!(f, "wait failed: {}", reason)
            }

            // Parsing errors
            Error::TooManyTokens { limit } => {
                write!(f, "too many arguments (limit {})", limit)
            }
            Error::EmptyCommand => {
                write!(f, "command cannot be empty")
            }
            Error::EmptyPipelineStage { position } => {
                write!(f, "empty command in pipeline at stage {}", position + 1)
            }
            Error::MissingRedirectTarget { operator } => {
                write!(f, "missing file name after '{}'", operator)
            }
            Error::MisplacedRedirect { stage, operator } => {
                write!(
                    f,
                    "'{}' is not allowed on pipeline stage {}",
                    operator,
                    stage + 1
                )
            }
            Error::InvalidPattern { pattern, reason } => {
                write!(f, "{}: invalid pattern: {}", pattern, reason)
            }

            // History errors
            Error::HistoryEventNotFound { prefix } => {
                write!(f, "!{}: event not found", prefix)
            }
            Error::RecursiveHistoryRecall { command } => {
                write!(f, "{}: recalled command is itself a history recall", command)
            }

            // Session errors
            Error::DirectoryChangeFailed { path, reason } => {
                write!(f, "cd: {}: {}", path.display(), reason)
            }
            Error::TerminalControlFailed { reason } => {
                write!(f, "terminal control failed: {}", reason)
            }
            Error::SignalSetupFailed { signal, reason } => {
                write!(f, "failed to set up {}: {}", signal, reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigNotFound => {
                write!(f, "Configuration file not found")
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }
            Error::ConfigSerializationFailed { format, reason } => {
                write!(f, "Failed to serialize config as {}: {}", format, reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }

            // I/O and system errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Sys(errno) => write!(f, "system error: {}", errno.desc()),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Sys(errno) => Some(errno),
            Error::Serde(err) => Some(err),
            Error::Toml(err) => Some(err),
            _ => None,
        }
    }
}

impl Error {
    /// Whether the error was raised while turning text into a pipeline,
    /// before any process could have been created
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::TooManyTokens { .. }
                | Error::EmptyCommand
                | Error::EmptyPipelineStage { .. }
                | Error::MissingRedirectTarget { .. }
                | Error::MisplacedRedirect { .. }
                | Error::InvalidPattern { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<nix::errno::Errno> for Error {
    fn from(errno: nix::errno::Errno) -> Self {
        Error::Sys(errno)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Error::InvalidPattern {
            pattern: String::new(),
            reason: err.msg.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
