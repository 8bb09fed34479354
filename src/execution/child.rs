//! Child-side setup between `fork` and `exec`
//!
//! Everything a child needs is prepared in the parent as a
//! [`PreparedStage`]. After `fork` the child only makes raw system calls
//! on that data and never returns into shell code.

use crate::error::{Error, Result};
use crate::jobs::signals;
use crate::models::{PipelineStage, RedirectMode};
use nix::errno::Errno;
use nix::libc::{self, c_char, c_int};
use std::ffi::CString;
use std::os::fd::RawFd;

/// Exit status when the program cannot be found
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit status when the program exists but cannot be executed
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Exit status when a redirection target cannot be opened
pub const EXIT_REDIRECT_FAILED: i32 = 1;

/// Permission bits for files created by `>` and `>>`
const OUTPUT_FILE_MODE: libc::mode_t = 0o644;

const ERROR_PREFIX: &str = "mosaicsh: ";

struct RedirectTarget {
    path: CString,
    flags: c_int,
    /// `"mosaicsh: <path>: "`
    message: Vec<u8>,
}

impl RedirectTarget {
    fn new(path: &std::path::Path, flags: c_int) -> Result<Self> {
        let display = path.display().to_string();
        let path = CString::new(display.as_bytes()).map_err(|_| Error::RedirectOpenFailure {
            path: path.to_path_buf(),
            reason: "file name contains a NUL byte".to_string(),
        })?;
        Ok(Self {
            path,
            flags,
            message: format!("{}{}: ", ERROR_PREFIX, display).into_bytes(),
        })
    }
}

/// One stage with every buffer the child needs already allocated
pub(crate) struct PreparedStage {
    pub name: String,
    argv: Vec<CString>,
    /// Null-terminated pointer array into `argv`
    argv_ptrs: Vec<*const c_char>,
    input: Option<RedirectTarget>,
    output: Option<RedirectTarget>,
    /// `"mosaicsh: <program>: "`
    exec_message: Vec<u8>,
}

impl PreparedStage {
    pub fn new(stage: &PipelineStage) -> Result<Self> {
        let name = stage.program().to_string();
        let argv = stage
            .argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::SpawnFailure {
                command: name.clone(),
                reason: "argument contains a NUL byte".to_string(),
            })?;
        if argv.is_empty() {
            return Err(Error::EmptyCommand);
        }

        let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|a| a.as_ptr()).collect();
        argv_ptrs.push(std::ptr::null());

        let input = stage
            .input
            .as_ref()
            .map(|spec| RedirectTarget::new(&spec.path, libc::O_RDONLY))
            .transpose()?;
        let output = stage
            .output
            .as_ref()
            .map(|spec| {
                let mode = match spec.mode {
                    RedirectMode::Truncate => libc::O_TRUNC,
                    RedirectMode::Append => libc::O_APPEND,
                };
                RedirectTarget::new(&spec.path, libc::O_WRONLY | libc::O_CREAT | mode)
            })
            .transpose()?;

        Ok(Self {
            exec_message: format!("{}{}: ", ERROR_PREFIX, name).into_bytes(),
            name,
            argv,
            argv_ptrs,
            input,
            output,
        })
    }

    pub fn has_output_redirect(&self) -> bool {
        self.output.is_some()
    }
}

/// Descriptors and group for one child
pub(crate) struct StageWiring<'a> {
    /// Read end of the previous pipe
    pub stdin: Option<RawFd>,
    /// Write end of the next pipe, or the capture pipe
    pub stdout: Option<RawFd>,
    /// Every pipe descriptor the parent holds; all are closed in the child
    pub close: &'a [RawFd],
    /// Group to join; `0` makes the child a new group leader
    pub pgid: libc::pid_t,
    /// Terminal to take for a foreground job
    pub terminal: Option<RawFd>,
}

/// Set the child up and exec the stage's program. Never returns.
pub(crate) fn exec_stage(stage: &PreparedStage, wiring: &StageWiring<'_>) -> ! {
    // SAFETY: plain system calls on descriptors and buffers that stay
    // valid in the child; none of them allocate.
    unsafe {
        libc::setpgid(0, wiring.pgid);
        if let Some(fd) = wiring.terminal {
            // SIGTTOU is still ignored at this point.
            libc::tcsetpgrp(fd, libc::getpgrp());
        }
    }
    signals::restore_default_signals();

    if let Some(fd) = wiring.stdin {
        redirect_fd(fd, libc::STDIN_FILENO);
    }
    if let Some(fd) = wiring.stdout {
        redirect_fd(fd, libc::STDOUT_FILENO);
    }
    if let Some(target) = &stage.input {
        open_onto(target, libc::STDIN_FILENO);
    }
    if let Some(target) = &stage.output {
        open_onto(target, libc::STDOUT_FILENO);
    }

    for &fd in wiring.close {
        // SAFETY: closing descriptors inherited from the parent.
        unsafe { libc::close(fd) };
    }

    // SAFETY: argv_ptrs is null-terminated and points into argv.
    unsafe { libc::execvp(stage.argv[0].as_ptr(), stage.argv_ptrs.as_ptr()) };

    let errno = Errno::last();
    let status = match errno {
        Errno::ENOENT | Errno::ENOTDIR => {
            write_stderr(&[&stage.exec_message, b"command not found\n"]);
            EXIT_NOT_FOUND
        }
        _ => {
            write_stderr(&[&stage.exec_message, errno.desc().as_bytes(), b"\n"]);
            EXIT_NOT_EXECUTABLE
        }
    };
    exit_child(status)
}

fn redirect_fd(from: RawFd, to: RawFd) {
    // SAFETY: both descriptors are open in the child.
    unsafe { libc::dup2(from, to) };
}

fn open_onto(target: &RedirectTarget, to: RawFd) {
    // SAFETY: path is a valid C string owned by the prepared stage.
    let fd = unsafe { libc::open(target.path.as_ptr(), target.flags, OUTPUT_FILE_MODE as c_int) };
    if fd < 0 {
        let errno = Errno::last();
        write_stderr(&[&target.message, errno.desc().as_bytes(), b"\n"]);
        exit_child(EXIT_REDIRECT_FAILED);
    }
    redirect_fd(fd, to);
    // SAFETY: fd was just opened and has been duplicated.
    unsafe { libc::close(fd) };
}

fn write_stderr(parts: &[&[u8]]) {
    for part in parts {
        // SAFETY: writing a borrowed buffer to stderr.
        unsafe { libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len()) };
    }
}

/// Leave the child without running atexit handlers or flushing buffers
/// inherited from the shell
pub(crate) fn exit_child(status: i32) -> ! {
    // SAFETY: _exit is async-signal-safe and never returns.
    unsafe { libc::_exit(status) }
}
