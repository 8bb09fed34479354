//! mosaicsh - an interactive Unix command shell

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use mosaicsh::{Config, Shell};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "mosaicsh", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Initial prompt text
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Run one command line and exit with its status
    #[arg(short = 'c', value_name = "LINE")]
    command: Option<String>,
}

fn debug_requested(args: &Args) -> bool {
    args.debug
        || env::var("MOSAICSH_DEBUG").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn init_logging(args: &Args, config: &Config) {
    let level = if debug_requested(args) {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };

    let env_filter = env::var("RUST_LOG").unwrap_or(level);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = mosaicsh::load_config(args.config.as_deref());
    if let Some(prompt) = &args.prompt {
        config.shell.prompt = prompt.clone();
    }

    init_logging(&args, &config);
    info!("starting {} v{}", mosaicsh::NAME, mosaicsh::VERSION);
    debug!(?config, "effective configuration");

    let status = match &args.command {
        Some(line) => {
            let mut shell =
                Shell::for_command(&config).context("failed to set up the command environment")?;
            shell.execute_line(line);
            shell.last_status()
        }
        None => {
            let mut shell =
                Shell::interactive(&config).context("failed to start the interactive shell")?;
            shell.run().context("shell terminated unexpectedly")?
        }
    };

    process::exit(status);
}
