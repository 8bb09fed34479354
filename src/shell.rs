//! Read-eval loop
//!
//! Glues the parser, builtins, orchestrator and job control together.
//! Each line is segmented into command units; each unit is recorded in
//! history, then handled as a history recall, a builtin, or a pipeline.
//! A failing unit prints one diagnostic and the next unit still runs.

use crate::builtins::{Builtin, Control};
use crate::commands::{self, FilesystemGlob, GlobExpander};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::execution::{LaunchOutcome, Orchestrator};
use crate::history::History;
use crate::jobs::{JobTable, Reaper, SignalFlags};
use crate::models::{CommandUnit, ProcessEvent};
use crate::session::ShellSession;
use std::io::{self, BufRead, Write};

/// Prefix of a history recall unit
pub const RECALL_MARKER: char = '!';

pub struct Shell {
    session: ShellSession,
    jobs: JobTable,
    history: History,
    orchestrator: Orchestrator,
    reaper: Reaper,
    signals: SignalFlags,
    glob: Box<dyn GlobExpander>,
    max_tokens: usize,
    last_status: i32,
    last_output: Option<Vec<u8>>,
}

impl Shell {
    /// Build a shell around an existing session
    pub fn new(config: &Config, session: ShellSession) -> Result<Self> {
        let signals = SignalFlags::install()?;
        let history = match &config.shell.history_file {
            Some(path) => History::with_file(config.shell.history_size, path.clone())?,
            None => History::new(config.shell.history_size),
        };

        Ok(Self {
            session,
            jobs: JobTable::new(config.jobs.retired_capacity),
            history,
            orchestrator: Orchestrator::new(config.execution.clone()),
            reaper: Reaper::new(signals.child_flag()),
            signals,
            glob: Box::new(FilesystemGlob::new()),
            max_tokens: config.shell.max_tokens,
            last_status: 0,
            last_output: None,
        })
    }

    /// Interactive shell that owns the terminal
    pub fn interactive(config: &Config) -> Result<Self> {
        let session = ShellSession::initialize(config.shell.prompt.clone())?;
        Self::new(config, session)
    }

    /// Shell for a `-c` command line
    pub fn for_command(config: &Config) -> Result<Self> {
        let session = ShellSession::for_command(config.shell.prompt.clone())?;
        Self::new(config, session)
    }

    /// Shell that never touches the terminal
    pub fn detached(config: &Config) -> Result<Self> {
        let session = ShellSession::detached(config.shell.prompt.clone())?;
        Self::new(config, session)
    }

    /// Replace the wildcard expander
    pub fn with_glob(mut self, glob: Box<dyn GlobExpander>) -> Self {
        self.glob = glob;
        self
    }

    pub fn session(&self) -> &ShellSession {
        &self.session
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Status of the last foreground pipeline
    pub fn last_status(&self) -> i32 {
        self.last_status
    }

    /// Captured stdout of the last foreground single command
    pub fn last_output(&self) -> Option<&[u8]> {
        self.last_output.as_deref()
    }

    /// Read lines from stdin until `exit` or end of input
    pub fn run(&mut self) -> Result<i32> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut line = String::new();

        loop {
            let events = self.poll_jobs();
            report(&events);
            if self.signals.take_interrupt() {
                trace!("interrupt at prompt");
            }

            print!("{}", self.session.render_prompt());
            io::stdout().flush()?;

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => {
                    println!();
                    break;
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            if self.execute_line(&line) == Control::Exit {
                break;
            }
        }

        info!("shell exiting");
        Ok(self.last_status)
    }

    /// Reap finished background work
    pub fn poll_jobs(&mut self) -> Vec<ProcessEvent> {
        self.reaper.poll(&mut self.jobs)
    }

    /// Run every command unit on `line`
    pub fn execute_line(&mut self, line: &str) -> Control {
        for unit in commands::segment(line) {
            match self.dispatch(&unit, false) {
                Ok(Control::Exit) => return Control::Exit,
                Ok(Control::Continue) => {}
                Err(e) => {
                    eprintln!("mosaicsh: {}", e);
                    self.last_status = 1;
                }
            }
        }
        Control::Continue
    }

    fn dispatch(&mut self, unit: &CommandUnit, recalled: bool) -> Result<Control> {
        if !recalled {
            self.history.add(&unit.text)?;
        }

        if let Some(rest) = unit.text.strip_prefix(RECALL_MARKER) {
            if recalled {
                return Err(Error::RecursiveHistoryRecall {
                    command: unit.text.clone(),
                });
            }
            let prefix = rest.split_whitespace().next().unwrap_or("");
            let text = self.history.recall(prefix)?;
            debug!("recalled {:?} for !{}", text, prefix);
            return self.dispatch_recalled(&text);
        }

        let pipeline = commands::plan_unit(&unit.text, self.glob.as_ref(), self.max_tokens)?;

        if pipeline.is_simple() {
            let stage = pipeline.first();
            if let Some(builtin) = Builtin::lookup(&stage.argv) {
                if stage.has_redirects() {
                    warn!("redirection ignored for builtin {}", builtin.name());
                }
                let mut out = io::stdout();
                let control = builtin.run(&stage.argv, &mut self.session, &self.history, &mut out)?;
                self.last_status = 0;
                return Ok(control);
            }
        }

        let outcome =
            self.orchestrator
                .launch(&mut self.session, &mut self.jobs, &pipeline, unit.background)?;

        match outcome {
            LaunchOutcome::Foreground(job) => {
                for event in job.stop_events() {
                    eprintln!("\n{}", event);
                }
                for failure in job.exec_failures() {
                    debug!("{}", failure);
                }
                self.last_status = job.status();
                self.last_output = job.captured;
            }
            LaunchOutcome::Background(job) => {
                println!("{}", job.announcement());
            }
        }
        Ok(Control::Continue)
    }

    /// Run recalled text as fresh input, without recording it again
    fn dispatch_recalled(&mut self, text: &str) -> Result<Control> {
        for unit in commands::segment(text) {
            if self.dispatch(&unit, true)? == Control::Exit {
                return Ok(Control::Exit);
            }
        }
        Ok(Control::Continue)
    }
}

/// Print asynchronous job notices
fn report(events: &[ProcessEvent]) {
    for event in events {
        println!("\n{}", event);
    }
}
