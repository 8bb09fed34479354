//! Shell session state
//!
//! One value per shell process holding the working directory, the prompt
//! and the process-group bookkeeping used for terminal handoff.

use crate::error::{Error, Result};
use crate::jobs::signals;
use crate::terminal::Terminal;
use nix::unistd::{getpgrp, Pid};
use std::env;
use std::path::{Path, PathBuf};

/// Placeholder in the prompt replaced by the working directory
pub const CWD_PLACEHOLDER: &str = "{cwd}";

#[derive(Debug)]
pub struct ShellSession {
    /// Directory the shell started in; `cd` with no argument returns here
    base_dir: PathBuf,
    cwd: PathBuf,
    prompt: String,
    shell_pgid: Pid,
    /// Group currently holding the terminal, when not the shell
    foreground_pgid: Option<Pid>,
    terminal: Terminal,
}

impl ShellSession {
    /// Start-up for an interactive shell: wait to be in the foreground,
    /// ignore job-control signals and take the terminal if there is one
    pub fn initialize(prompt: impl Into<String>) -> Result<Self> {
        let terminal = Terminal::stderr();
        terminal.wait_for_foreground()?;
        signals::ignore_job_control_signals()?;
        let shell_pgid = terminal.claim()?;
        let base_dir = env::current_dir()?;
        info!(
            interactive = terminal.is_interactive(),
            "session started in {}",
            base_dir.display()
        );
        Ok(Self::build(base_dir, prompt.into(), shell_pgid, terminal))
    }

    /// Session for a one-off command line. On a tty its jobs still get
    /// the terminal, so they can read it and receive keyboard signals;
    /// anywhere else it is [`detached`](Self::detached).
    pub fn for_command(prompt: impl Into<String>) -> Result<Self> {
        if Terminal::stderr().is_interactive() {
            Self::initialize(prompt)
        } else {
            Self::detached(prompt)
        }
    }

    /// A session that never touches terminal ownership or signal
    /// dispositions
    pub fn detached(prompt: impl Into<String>) -> Result<Self> {
        let base_dir = env::current_dir()?;
        Ok(Self::build(
            base_dir,
            prompt.into(),
            getpgrp(),
            Terminal::detached(),
        ))
    }

    fn build(base_dir: PathBuf, prompt: String, shell_pgid: Pid, terminal: Terminal) -> Self {
        Self {
            cwd: base_dir.clone(),
            base_dir,
            prompt,
            shell_pgid,
            foreground_pgid: None,
            terminal,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Working directory with the base directory shown as `~`
    pub fn display_cwd(&self) -> String {
        match self.cwd.strip_prefix(&self.base_dir) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => self.cwd.display().to_string(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Prompt text as printed before each line
    pub fn render_prompt(&self) -> String {
        let text = if self.prompt.contains(CWD_PLACEHOLDER) {
            self.prompt.replace(CWD_PLACEHOLDER, &self.display_cwd())
        } else {
            self.prompt.clone()
        };
        format!("{} ", text)
    }

    /// Change directory. `None`, `~` and `~/` go back to the base directory.
    pub fn change_dir(&mut self, target: Option<&str>) -> Result<()> {
        let dest = match target {
            None | Some("~") | Some("~/") => self.base_dir.clone(),
            Some(dir) => PathBuf::from(dir),
        };

        env::set_current_dir(&dest).map_err(|e| Error::DirectoryChangeFailed {
            path: dest.clone(),
            reason: e.to_string(),
        })?;
        self.cwd = env::current_dir()?;
        debug!("changed directory to {}", self.cwd.display());
        Ok(())
    }

    pub fn shell_pgid(&self) -> Pid {
        self.shell_pgid
    }

    pub fn foreground_pgid(&self) -> Option<Pid> {
        self.foreground_pgid
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Give the terminal to a foreground job
    pub fn hand_terminal_to(&mut self, pgid: Pid) -> Result<()> {
        self.terminal.give_to(pgid)?;
        self.foreground_pgid = Some(pgid);
        Ok(())
    }

    /// Take the terminal back after a foreground job finished or stopped
    pub fn reclaim_terminal(&mut self) -> Result<()> {
        self.foreground_pgid = None;
        self.terminal.give_to(self.shell_pgid)
    }
}
