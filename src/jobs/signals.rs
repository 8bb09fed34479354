//! Shell Signal Handling
//!
//! The shell ignores the job-control signals at its own level and turns
//! `SIGINT` and `SIGCHLD` into flags that the main loop polls. Children
//! put every disposition back to default before exec.

use crate::error::{Error, Result};
use nix::sys::signal::{signal, SigHandler, Signal};
use signal_hook::SigId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Signals the shell ignores while it owns the terminal
pub const SHELL_IGNORED: [Signal; 4] = [
    Signal::SIGTSTP,
    Signal::SIGQUIT,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

/// Signals reset to their default action in every child
pub const CHILD_DEFAULTS: [Signal; 6] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
    Signal::SIGCHLD,
];

/// Ignore the job-control signals in the shell process
pub fn ignore_job_control_signals() -> Result<()> {
    for sig in SHELL_IGNORED {
        // SAFETY: SigIgn installs no handler code.
        unsafe { signal(sig, SigHandler::SigIgn) }.map_err(|e| Error::SignalSetupFailed {
            signal: sig.as_str().to_string(),
            reason: e.desc().to_string(),
        })?;
    }
    debug!("ignoring job-control signals");
    Ok(())
}

/// Restore default dispositions. Called in a freshly forked child, so it
/// must stay async-signal-safe: no allocation, no logging.
pub(crate) fn restore_default_signals() {
    for sig in CHILD_DEFAULTS {
        // SAFETY: SigDfl installs no handler code.
        let _ = unsafe { signal(sig, SigHandler::SigDfl) };
    }
}

/// Flags raised by the shell's signal handlers.
///
/// The handlers only store `true`; all bookkeeping happens on the main
/// thread when it polls. Handlers are unregistered on drop.
pub struct SignalFlags {
    child: Arc<AtomicBool>,
    interrupt: Arc<AtomicBool>,
    ids: Vec<SigId>,
}

impl SignalFlags {
    /// Register the `SIGCHLD` and `SIGINT` flag handlers
    pub fn install() -> Result<Self> {
        let child = Arc::new(AtomicBool::new(false));
        let interrupt = Arc::new(AtomicBool::new(false));
        let mut ids = Vec::with_capacity(2);

        for (sig, flag) in [
            (Signal::SIGCHLD, &child),
            (Signal::SIGINT, &interrupt),
        ] {
            let id = signal_hook::flag::register(sig as i32, Arc::clone(flag)).map_err(|e| {
                Error::SignalSetupFailed {
                    signal: sig.as_str().to_string(),
                    reason: e.to_string(),
                }
            })?;
            ids.push(id);
        }

        debug!("installed SIGCHLD and SIGINT flag handlers");
        Ok(Self {
            child,
            interrupt,
            ids,
        })
    }

    /// Shared flag set whenever a child changes state
    pub fn child_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.child)
    }

    /// Consume a pending interrupt, returning whether one arrived
    pub fn take_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::AcqRel)
    }
}

impl Drop for SignalFlags {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}
