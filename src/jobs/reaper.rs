//! Signal Reaper
//!
//! `SIGCHLD` only raises a flag. The main loop calls [`Reaper::poll`]
//! before each prompt, which drains every pending child status change
//! without blocking and applies it to the job table.

use super::table::JobTable;
use crate::models::{ProcessEvent, ProcessEventKind};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Translate a wait status into the pid and event it describes.
/// Continue and ptrace notifications are not tracked.
pub fn classify(status: WaitStatus) -> Option<(Pid, ProcessEventKind)> {
    match status {
        WaitStatus::Exited(pid, code) => Some((pid, ProcessEventKind::Exited(code))),
        WaitStatus::Signaled(pid, signal, _) => Some((pid, ProcessEventKind::Signaled(signal))),
        WaitStatus::Stopped(pid, signal) => Some((pid, ProcessEventKind::Stopped(signal))),
        _ => None,
    }
}

/// Collects child status changes flagged by `SIGCHLD`
pub struct Reaper {
    pending: Arc<AtomicBool>,
}

impl Reaper {
    pub fn new(pending: Arc<AtomicBool>) -> Self {
        Self { pending }
    }

    /// Reap if a `SIGCHLD` arrived since the last poll
    pub fn poll(&self, table: &mut JobTable) -> Vec<ProcessEvent> {
        // Clear first so a signal landing mid-drain is seen next time.
        if !self.pending.swap(false, Ordering::AcqRel) {
            return Vec::new();
        }
        Self::reap_available(table)
    }

    /// Drain every child status change available right now
    pub fn reap_available(table: &mut JobTable) -> Vec<ProcessEvent> {
        let mut events = Vec::new();
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;

        loop {
            match waitpid(Pid::from_raw(-1), Some(flags)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    let Some((pid, kind)) = classify(status) else {
                        continue;
                    };
                    match table.record_event(pid, kind) {
                        Some(event) => {
                            debug!(pid = pid.as_raw(), "reaped: {}", event);
                            events.push(event);
                        }
                        None => trace!(pid = pid.as_raw(), "status change for untracked pid"),
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(e) => {
                    warn!("waitpid failed while reaping: {}", e.desc());
                    break;
                }
            }
        }

        events
    }
}
