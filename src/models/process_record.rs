//! Process Record Model
//!
//! Lifecycle record for one spawned process, owned by the job table.
//! Transitions only move forward: `Running -> Stopped -> Reaped` or
//! `Running -> Reaped`.

use chrono::{DateTime, Utc};
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::fmt;

/// Lifecycle state of a spawned process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessState {
    /// Process is running (or has not yet reported a change)
    Running,
    /// Process was stopped by a job-control signal
    Stopped,
    /// Process has terminated and been waited on
    Reaped,
}

impl ProcessState {
    /// Whether moving from `self` to `next` is a legal forward transition
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        self < next
    }

    pub fn is_active(self) -> bool {
        !matches!(self, ProcessState::Reaped)
    }
}

/// How a reaped process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Normal exit with a status code
    Exited(i32),
    /// Killed by a signal
    Signaled(Signal),
}

impl ProcessExit {
    /// Shell-style status: the exit code, or 128 + signal number
    pub fn status_code(&self) -> i32 {
        match self {
            ProcessExit::Exited(code) => *code,
            ProcessExit::Signaled(signal) => 128 + *signal as i32,
        }
    }
}

/// Metadata and lifecycle state for one process in the job table
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub pgid: Pid,
    /// Program name shown in notifications
    pub display_name: String,
    pub state: ProcessState,
    /// Background job number, if launched with `&`
    pub job_id: Option<usize>,
    pub exit: Option<ProcessExit>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProcessRecord {
    /// A freshly spawned, running process
    pub fn new(pid: Pid, pgid: Pid, display_name: impl Into<String>) -> Self {
        Self {
            pid,
            pgid,
            display_name: display_name.into(),
            state: ProcessState::Running,
            job_id: None,
            exit: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn with_job_id(mut self, job_id: usize) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Mark the process stopped. Returns false if that would move backwards.
    pub fn mark_stopped(&mut self) -> bool {
        if !self.state.can_transition_to(ProcessState::Stopped) {
            return false;
        }
        self.state = ProcessState::Stopped;
        true
    }

    /// Mark the process reaped. Returns false if it was already reaped.
    pub fn mark_reaped(&mut self, exit: ProcessExit) -> bool {
        if !self.state.can_transition_to(ProcessState::Reaped) {
            return false;
        }
        self.state = ProcessState::Reaped;
        self.exit = Some(exit);
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ProcessState::Stopped
    }

    pub fn is_reaped(&self) -> bool {
        self.state == ProcessState::Reaped
    }

    /// Wall-clock time between spawn and reap
    pub fn execution_duration(&self) -> Option<std::time::Duration> {
        self.finished_at
            .map(|end| end.signed_duration_since(self.started_at).to_std().unwrap_or_default())
    }
}

/// What happened to a process, as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEventKind {
    Exited(i32),
    Signaled(Signal),
    Stopped(Signal),
}

/// A state change observed for a process in the job table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEvent {
    pub pid: Pid,
    pub name: String,
    pub kind: ProcessEventKind,
}

impl ProcessEvent {
    pub fn new(pid: Pid, name: impl Into<String>, kind: ProcessEventKind) -> Self {
        Self {
            pid,
            name: name.into(),
            kind,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self.kind, ProcessEventKind::Stopped(_))
    }

    /// The terminal exit this event represents, if any
    pub fn exit(&self) -> Option<ProcessExit> {
        match self.kind {
            ProcessEventKind::Exited(code) => Some(ProcessExit::Exited(code)),
            ProcessEventKind::Signaled(signal) => Some(ProcessExit::Signaled(signal)),
            ProcessEventKind::Stopped(_) => None,
        }
    }
}

impl fmt::Display for ProcessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ProcessEventKind::Exited(_) => {
                write!(f, "{} with pid {} exited normally", self.name, self.pid)
            }
            ProcessEventKind::Signaled(_) => {
                write!(f, "{} with pid {} has exited with signal", self.name, self.pid)
            }
            ProcessEventKind::Stopped(_) => {
                write!(f, "{} with pid {} has stopped!", self.name, self.pid)
            }
        }
    }
}
