//! Process Orchestrator
//!
//! Realizes a [`Pipeline`] as one OS process per stage:
//!
//! 1. allocate the `N - 1` inter-stage pipes (and the capture pipe for a
//!    foreground single command)
//! 2. fork each stage left to right; every child joins the group of the
//!    first one, wires its standard streams and execs
//! 3. register every child in the [`JobTable`] as running
//! 4. foreground: hand the terminal to the group, wait for every stage to
//!    exit or stop, take the terminal back
//! 5. background: return straight away with the job number
//!
//! If a fork fails part way, the stages already started are killed and
//! reaped so no stage is left writing into a pipe nobody reads.

pub mod capture;
mod child;
pub mod pipes;

pub use child::{EXIT_NOT_EXECUTABLE, EXIT_NOT_FOUND, EXIT_REDIRECT_FAILED};

use crate::config::ExecutionConfig;
use crate::error::{Error, Result};
use crate::jobs::reaper::classify;
use crate::jobs::JobTable;
use crate::models::{Pipeline, ProcessEvent, ProcessEventKind, ProcessRecord};
use crate::session::ShellSession;
use capture::OutputCapture;
use child::{PreparedStage, StageWiring};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::{fork, setpgid, ForkResult, Pid};
use pipes::{Pipe, PipeSet};
use std::os::fd::AsRawFd;

/// Result of waiting on a foreground pipeline
#[derive(Debug, Clone)]
pub struct ForegroundJob {
    pub pgid: Pid,
    /// Spawned pids in stage order
    pub pids: Vec<Pid>,
    /// One event per stage, in the order the kernel reported them
    pub events: Vec<ProcessEvent>,
    /// Retained stdout of a captured single command
    pub captured: Option<Vec<u8>>,
}

impl ForegroundJob {
    /// Whether any stage was stopped rather than finished
    pub fn stopped(&self) -> bool {
        self.events.iter().any(ProcessEvent::is_stop)
    }

    /// Events for stages that stopped
    pub fn stop_events(&self) -> impl Iterator<Item = &ProcessEvent> {
        self.events.iter().filter(|e| e.is_stop())
    }

    /// Shell-style status of the last stage: the exit code, or 128 plus
    /// the signal number
    pub fn status(&self) -> i32 {
        let last = self.pids.last().copied();
        self.events
            .iter()
            .find(|e| Some(e.pid) == last)
            .map(|e| match e.kind {
                ProcessEventKind::Exited(code) => code,
                ProcessEventKind::Signaled(sig) | ProcessEventKind::Stopped(sig) => {
                    128 + sig as i32
                }
            })
            .unwrap_or(0)
    }

    /// Stages whose program could not be run
    pub fn exec_failures(&self) -> Vec<Error> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                ProcessEventKind::Exited(status)
                    if status == EXIT_NOT_FOUND || status == EXIT_NOT_EXECUTABLE =>
                {
                    Some(Error::ExecFailure {
                        command: e.name.clone(),
                        status,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

/// A pipeline left running in the background
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundJob {
    pub job_id: usize,
    pub pgid: Pid,
    /// Spawned pids in stage order
    pub pids: Vec<Pid>,
}

impl BackgroundJob {
    /// First stage's pid
    pub fn leader(&self) -> Pid {
        self.pgid
    }

    /// `[<job>] <pid>` as printed when the job starts
    pub fn announcement(&self) -> String {
        format!("[{}] {}", self.job_id, self.leader())
    }
}

#[derive(Debug, Clone)]
pub enum LaunchOutcome {
    Foreground(ForegroundJob),
    Background(BackgroundJob),
}

/// Spawns pipelines and waits on foreground jobs
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: ExecutionConfig,
}

impl Orchestrator {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    fn should_capture(&self, pipeline: &Pipeline, background: bool) -> bool {
        self.config.capture_foreground_output
            && !background
            && pipeline.is_simple()
            && pipeline.output_redirect().is_none()
    }

    /// Start `pipeline`, waiting for it unless `background` is set
    pub fn launch(
        &self,
        session: &mut ShellSession,
        jobs: &mut JobTable,
        pipeline: &Pipeline,
        background: bool,
    ) -> Result<LaunchOutcome> {
        let prepared = pipeline
            .stages()
            .iter()
            .map(PreparedStage::new)
            .collect::<Result<Vec<_>>>()?;

        // Nothing has been forked yet, so failing here leaves no trace.
        let pipes = PipeSet::allocate(prepared.len())?;
        let capture_pipe = if self.should_capture(pipeline, background) {
            Some(Pipe::new()?)
        } else {
            None
        };

        let mut inherited = pipes.raw_fds();
        if let Some(pipe) = &capture_pipe {
            inherited.push(pipe.read.as_raw_fd());
            inherited.push(pipe.write.as_raw_fd());
        }
        let terminal = if background {
            None
        } else {
            session.terminal().control_fd()
        };
        let job_id = background.then(|| jobs.next_job_id());

        let mut pgid: Option<Pid> = None;
        let mut spawned: Vec<(Pid, String)> = Vec::with_capacity(prepared.len());
        let last_index = prepared.len() - 1;

        for (index, stage) in prepared.iter().enumerate() {
            let mut stdout = pipes.stdout_for(index);
            if index == last_index && !stage.has_output_redirect() {
                stdout = stdout.or_else(|| capture_pipe.as_ref().map(|p| p.write.as_raw_fd()));
            }
            let wiring = StageWiring {
                stdin: pipes.stdin_for(index),
                stdout,
                close: &inherited,
                pgid: pgid.map_or(0, Pid::as_raw),
                terminal,
            };

            // SAFETY: the child only runs `exec_stage`, which sticks to
            // async-signal-safe calls on buffers prepared above.
            match unsafe { fork() } {
                Ok(ForkResult::Child) => child::exec_stage(stage, &wiring),
                Ok(ForkResult::Parent { child }) => {
                    let group = *pgid.get_or_insert(child);
                    // Also done by the child; whichever runs first wins.
                    if let Err(e) = setpgid(child, group) {
                        trace!(pid = child.as_raw(), "parent setpgid: {}", e.desc());
                    }
                    debug!(pid = child.as_raw(), pgid = group.as_raw(), stage = index, "spawned {}", stage.name);

                    let mut record = ProcessRecord::new(child, group, stage.name.as_str());
                    if let Some(id) = job_id {
                        record = record.with_job_id(id);
                    }
                    jobs.insert(record);
                    spawned.push((child, stage.name.clone()));
                }
                Err(errno) => {
                    error!(stage = index, "fork failed for {}: {}", stage.name, errno.desc());
                    drop(pipes);
                    drop(capture_pipe);
                    abort_spawned(jobs, &spawned);
                    return Err(Error::SpawnFailure {
                        command: stage.name.clone(),
                        reason: errno.desc().to_string(),
                    });
                }
            }
        }

        // The parent keeps no pipe ends; stages see EOF once their
        // neighbours exit.
        drop(pipes);
        let capture = match capture_pipe {
            Some(Pipe { read, write }) => {
                drop(write);
                Some(OutputCapture::spawn(read, self.config.capture_limit_bytes)?)
            }
            None => None,
        };

        let pgid = pgid.ok_or(Error::EmptyCommand)?;
        let pids: Vec<Pid> = spawned.iter().map(|(pid, _)| *pid).collect();

        if let Some(job_id) = job_id {
            info!(job = job_id, pgid = pgid.as_raw(), "started background job");
            return Ok(LaunchOutcome::Background(BackgroundJob { job_id, pgid, pids }));
        }

        if let Err(e) = session.hand_terminal_to(pgid) {
            warn!("could not hand terminal to job {}: {}", pgid, e);
        }
        let waited = wait_foreground(jobs, pgid, &spawned);
        if let Err(e) = session.reclaim_terminal() {
            warn!("could not reclaim terminal: {}", e);
        }
        let events = waited?;

        let stopped = events.iter().any(ProcessEvent::is_stop);
        let captured = match capture {
            Some(capture) if !stopped => Some(capture.finish()),
            // A stopped job may still write later; leave the reader running.
            Some(_) => None,
            None => None,
        };

        Ok(LaunchOutcome::Foreground(ForegroundJob {
            pgid,
            pids,
            events,
            captured,
        }))
    }
}

/// Block until every spawned stage of group `pgid` has exited, been
/// killed or stopped.
fn wait_foreground(
    jobs: &mut JobTable,
    pgid: Pid,
    spawned: &[(Pid, String)],
) -> Result<Vec<ProcessEvent>> {
    let mut events = Vec::with_capacity(spawned.len());
    let group = Pid::from_raw(-pgid.as_raw());

    while events.len() < spawned.len() {
        match waitpid(group, Some(WaitPidFlag::WUNTRACED)) {
            Ok(status) => {
                let Some((pid, kind)) = classify(status) else {
                    continue;
                };
                let event = jobs.record_event(pid, kind).unwrap_or_else(|| {
                    let name = spawned
                        .iter()
                        .find(|(p, _)| *p == pid)
                        .map(|(_, name)| name.as_str())
                        .unwrap_or("?");
                    ProcessEvent::new(pid, name, kind)
                });
                debug!(pid = pid.as_raw(), pgid = pgid.as_raw(), "foreground: {}", event);
                events.push(event);
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => {
                debug!(pgid = pgid.as_raw(), "no children left in group");
                break;
            }
            Err(e) => {
                return Err(Error::WaitFailed {
                    reason: e.desc().to_string(),
                })
            }
        }
    }

    Ok(events)
}

/// Kill and reap stages started before a later stage failed to fork
fn abort_spawned(jobs: &mut JobTable, spawned: &[(Pid, String)]) {
    for (pid, name) in spawned {
        warn!(pid = pid.as_raw(), "killing {} after a sibling failed to start", name);
        if let Err(e) = kill(*pid, Signal::SIGKILL) {
            debug!(pid = pid.as_raw(), "kill: {}", e.desc());
        }
        loop {
            match waitpid(*pid, None) {
                Ok(status) => {
                    if let Some((pid, kind)) = classify(status) {
                        jobs.record_event(pid, kind);
                    }
                    break;
                }
                Err(Errno::EINTR) => continue,
                Err(_) => break,
            }
        }
    }
}
