//! Inter-stage pipes

use crate::error::{Error, Result};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::unistd::pipe;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

/// A pipe as owned descriptors; both ends close on drop and on exec.
/// Children see them only through the `dup2` onto their standard streams.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl Pipe {
    pub fn new() -> Result<Self> {
        let (read, write) = pipe().map_err(setup_error)?;
        for end in [&read, &write] {
            fcntl(end, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(setup_error)?;
        }
        Ok(Self { read, write })
    }
}

fn setup_error(errno: Errno) -> Error {
    Error::PipeSetupFailure {
        reason: errno.desc().to_string(),
    }
}

/// The `N - 1` pipes joining the stages of an `N`-stage pipeline.
///
/// Allocation is all-or-nothing: if any pipe fails, the ones already
/// created are closed and nothing is returned.
#[derive(Debug)]
pub struct PipeSet {
    pipes: Vec<Pipe>,
}

impl PipeSet {
    pub fn allocate(stage_count: usize) -> Result<Self> {
        let count = stage_count.saturating_sub(1);
        let mut pipes = Vec::with_capacity(count);
        for _ in 0..count {
            pipes.push(Pipe::new()?);
        }
        trace!("allocated {} pipe(s)", count);
        Ok(Self { pipes })
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Descriptor stage `index` reads from, if it is not the first stage
    pub fn stdin_for(&self, index: usize) -> Option<RawFd> {
        index
            .checked_sub(1)
            .and_then(|prev| self.pipes.get(prev))
            .map(|p| p.read.as_raw_fd())
    }

    /// Descriptor stage `index` writes to, if it is not the last stage
    pub fn stdout_for(&self, index: usize) -> Option<RawFd> {
        self.pipes.get(index).map(|p| p.write.as_raw_fd())
    }

    /// Every descriptor in the set
    pub fn raw_fds(&self) -> Vec<RawFd> {
        self.pipes
            .iter()
            .flat_map(|p| [p.read.as_raw_fd(), p.write.as_raw_fd()])
            .collect()
    }
}
