//! mosaicsh - an interactive Unix command shell
//!
//! This library provides the command-execution and job-control engine
//! behind the `mosaicsh` binary.
//!
//! ## Features
//!
//! - **Pipelines:** `a | b | c`, every stage in one process group
//! - **Redirection:** `<file`, `>file` and `>>file` on the pipeline ends
//! - **Background jobs:** `cmd &` returns to the prompt immediately
//! - **Job control:** terminal handoff to the foreground job, stop notices
//! - **Wildcards:** `*` and `?` expanded against the filesystem
//! - **History:** bounded history with `!prefix` recall
//!
//! ## Module Organization
//!
//! ### Parsing
//!
//! - [`commands`] - segmenter, pipeline planner, tokenizer, glob expansion
//! - [`models`] - command units, pipelines, process records
//!
//! ### Execution
//!
//! - [`execution`] - fork/exec orchestration and foreground waits
//! - [`jobs`] - job table, signal reaper, signal dispositions
//! - [`terminal`] - controlling-terminal ownership
//! - [`session`] - working directory, prompt, process groups
//!
//! ### Shell
//!
//! - [`shell`] - the read-eval loop
//! - [`builtins`] - `history`, `cd`, `pwd`, `prompt`, `exit`
//! - [`history`] - command history
//! - [`config`] - configuration loading and validation
//! - [`mod@error`] - error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use mosaicsh::{Config, Shell};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut shell = Shell::detached(&Config::default())?;
//! shell.execute_line("ls | wc -l; sleep 1 &");
//! println!("status {}", shell.last_status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The shell's control flow is single-threaded. `SIGCHLD` only sets a
//! flag; the job table is updated on the main thread before each prompt.
//! The one helper thread copies captured foreground output to stdout.

#[cfg(not(unix))]
compile_error!("mosaicsh only supports Unix platforms");

#[macro_use]
extern crate tracing;

pub mod builtins;
pub mod commands;
pub mod config;
pub mod error;
pub mod execution;
pub mod history;
pub mod jobs;
pub mod models;
pub mod session;
pub mod shell;
pub mod terminal;

// Re-exports for core functionality
pub use builtins::Control;
pub use config::{Config, ConfigLoader};
pub use error::{Error, Result};
pub use execution::{BackgroundJob, ForegroundJob, LaunchOutcome, Orchestrator};
pub use jobs::JobTable;
pub use session::ShellSession;
pub use shell::Shell;

// Version information
/// The current version of mosaicsh from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Load configuration from `explicit` or the default locations.
///
/// A configuration that fails validation is reported and replaced by
/// the defaults; the shell always starts.
pub fn load_config(explicit: Option<&std::path::Path>) -> Config {
    let mut loader = ConfigLoader::with_explicit_path(explicit);
    match loader.load_with_options(config::LoadOptions::default()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}. Using defaults", NAME, e);
            Config::default()
        }
    }
}
