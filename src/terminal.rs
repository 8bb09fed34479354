//! Controlling-terminal ownership
//!
//! Which process group the terminal delivers keyboard signals and input
//! to. When the shell is not attached to a tty every operation here is a
//! no-op, so the engine runs unchanged under pipes and in tests.

use crate::error::{Error, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{getpgrp, getpid, setpgid, tcgetpgrp, tcsetpgrp, Pid};
use std::io::IsTerminal;
use std::os::fd::{BorrowedFd, RawFd};

/// Descriptor the shell uses for terminal control
pub const TERMINAL_FD: RawFd = nix::libc::STDERR_FILENO;

#[derive(Debug, Clone, Copy)]
pub struct Terminal {
    fd: RawFd,
    interactive: bool,
}

impl Terminal {
    /// The shell's standard terminal descriptor
    pub fn stderr() -> Self {
        Self::from_fd(TERMINAL_FD)
    }

    /// Wrap `fd`, detecting whether it is a tty
    pub fn from_fd(fd: RawFd) -> Self {
        // SAFETY: only used for the duration of the isatty check.
        let interactive = unsafe { BorrowedFd::borrow_raw(fd) }.is_terminal();
        Self { fd, interactive }
    }

    /// A terminal that never changes ownership
    pub fn detached() -> Self {
        Self {
            fd: TERMINAL_FD,
            interactive: false,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// The raw descriptor, when ownership transfers apply
    pub fn control_fd(&self) -> Option<RawFd> {
        self.interactive.then_some(self.fd)
    }

    fn borrow(&self) -> BorrowedFd<'_> {
        // SAFETY: fd is one of the standard descriptors, open for the
        // lifetime of the process.
        unsafe { BorrowedFd::borrow_raw(self.fd) }
    }

    /// Block until the shell's group is in the foreground. Each round
    /// stops the group with `SIGTTIN`, so this must run before the
    /// job-control signals are ignored.
    pub fn wait_for_foreground(&self) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }

        loop {
            let owner = tcgetpgrp(self.borrow()).map_err(control_error)?;
            let ours = getpgrp();
            if owner == ours {
                return Ok(());
            }
            debug!(owner = owner.as_raw(), ours = ours.as_raw(), "waiting for the foreground");
            killpg(ours, Signal::SIGTTIN).map_err(control_error)?;
        }
    }

    /// Put the shell in its own process group and take the terminal.
    ///
    /// Job-control signals must already be ignored, otherwise the
    /// `tcsetpgrp` stops the shell with `SIGTTOU`.
    pub fn claim(&self) -> Result<Pid> {
        if !self.interactive {
            return Ok(getpgrp());
        }

        let pid = getpid();
        if getpgrp() != pid {
            setpgid(pid, pid).map_err(control_error)?;
        }
        tcsetpgrp(self.borrow(), pid).map_err(control_error)?;
        info!(pgid = pid.as_raw(), "shell owns the terminal");
        Ok(pid)
    }

    /// Make `pgid` the foreground process group
    pub fn give_to(&self, pgid: Pid) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }
        trace!(pgid = pgid.as_raw(), "handing terminal over");
        tcsetpgrp(self.borrow(), pgid).map_err(control_error)
    }

    /// Current foreground process group, if interactive
    pub fn foreground_group(&self) -> Option<Pid> {
        if !self.interactive {
            return None;
        }
        tcgetpgrp(self.borrow()).ok()
    }
}

fn control_error(errno: nix::errno::Errno) -> Error {
    Error::TerminalControlFailed {
        reason: errno.desc().to_string(),
    }
}
