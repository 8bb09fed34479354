//! Foreground output capture
//!
//! A foreground single command writes its stdout into a pipe. A reader
//! thread copies every chunk to the shell's stdout as it arrives and keeps
//! up to a byte limit for the caller.
//!
//! The reader does not wait for end of file once the command has been
//! reaped: a process the command left behind may hold the pipe open for
//! as long as it likes.

use crate::error::{Error, Result};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, OwnedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const READ_CHUNK: usize = 8192;

/// How often a reader with nothing to read checks whether it was stopped
const POLL_INTERVAL_MS: u16 = 50;

/// Upper bound on what is drained after a stop: one pipe buffer, the most
/// the reaped command can have left behind
const DRAIN_LIMIT: usize = 64 * 1024;

/// Handle to a running capture thread
pub struct OutputCapture {
    handle: JoinHandle<Vec<u8>>,
    closing: Arc<AtomicBool>,
}

impl OutputCapture {
    /// Start reading from `read_end`. The write end must already be closed
    /// in this process, otherwise the thread never sees end of file.
    pub fn spawn(read_end: OwnedFd, limit: usize) -> Result<Self> {
        let closing = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&closing);
        let handle = thread::Builder::new()
            .name("mosaicsh-capture".to_string())
            .spawn(move || drain(read_end, io::stdout(), limit, &flag))
            .map_err(|e| Error::Other(format!("failed to start output capture: {}", e)))?;
        Ok(Self { handle, closing })
    }

    /// Collect what is already in the pipe and return the retained bytes.
    /// Call once the command is reaped; writers still holding the pipe
    /// are not waited for.
    pub fn finish(self) -> Vec<u8> {
        self.closing.store(true, Ordering::Release);
        match self.handle.join() {
            Ok(bytes) => bytes,
            Err(_) => {
                warn!("output capture thread panicked");
                Vec::new()
            }
        }
    }
}

/// Copies chunks to a sink and keeps at most `limit` bytes of them
pub struct Tee<W: Write> {
    sink: W,
    captured: Vec<u8>,
    limit: usize,
    display: bool,
}

impl<W: Write> Tee<W> {
    pub fn new(sink: W, limit: usize) -> Self {
        Self {
            sink,
            captured: Vec::new(),
            limit,
            display: true,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        if self.display {
            if let Err(e) = self.sink.write_all(chunk).and_then(|_| self.sink.flush()) {
                // Keep draining so the writer does not block on a full pipe.
                debug!("capture display failed: {}", e);
                self.display = false;
            }
        }

        let room = self.limit.saturating_sub(self.captured.len());
        self.captured.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    pub fn into_captured(self) -> Vec<u8> {
        self.captured
    }
}

/// Read `read_end` into a [`Tee`] until end of file, or until `closing`
/// is set and the pipe has nothing more to give right away.
fn drain<W: Write>(read_end: OwnedFd, sink: W, limit: usize, closing: &AtomicBool) -> Vec<u8> {
    let mut source = File::from(read_end);
    let mut tee = Tee::new(sink, limit);
    let mut buf = [0u8; READ_CHUNK];
    let mut drained = 0usize;

    loop {
        // Checked before polling, so data written before the stop is seen.
        let stopping = closing.load(Ordering::Acquire);
        if stopping && drained >= DRAIN_LIMIT {
            debug!("capture stopped after draining {} bytes", drained);
            break;
        }

        let timeout = if stopping {
            PollTimeout::ZERO
        } else {
            PollTimeout::from(POLL_INTERVAL_MS)
        };
        let ready = {
            let mut fds = [PollFd::new(source.as_fd(), PollFlags::POLLIN)];
            poll(&mut fds, timeout)
        };
        match ready {
            Ok(0) if stopping => {
                debug!("capture stopped with the pipe still open");
                break;
            }
            Ok(0) | Err(Errno::EINTR) => continue,
            Ok(_) => {}
            Err(e) => {
                debug!("capture poll failed: {}", e.desc());
                break;
            }
        }

        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("capture read failed: {}", e);
                break;
            }
        };
        tee.push(&buf[..n]);
        if stopping {
            drained += n;
        }
    }

    tee.into_captured()
}
