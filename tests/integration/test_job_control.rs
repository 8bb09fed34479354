//! Integration Tests for Job Control
//!
//! These tests cover background jobs, process groups, stop notices and
//! asynchronous reaping through the job table.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use mosaicsh::jobs::Reaper;
use mosaicsh::models::{ProcessEvent, ProcessEventKind, ProcessState};
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::getpgid;
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use test_utils::{engine_lock, wait_until, Engine};

const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Reap until `count` events have been collected or the timeout passes
fn reap_events(engine: &mut Engine, count: usize) -> Vec<ProcessEvent> {
    let mut events = Vec::new();
    wait_until(REAP_TIMEOUT, || {
        events.extend(Reaper::reap_available(&mut engine.jobs));
        events.len() >= count
    });
    events
}

#[test]
fn test_background_job_returns_immediately() {
    let _guard = engine_lock();
    let mut engine = Engine::new();

    let started = Instant::now();
    let job = engine.spawn("sleep 100");
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(job.job_id, 1);
    assert_eq!(job.pids.len(), 1);
    assert_eq!(job.announcement(), format!("[1] {}", job.pids[0]));

    let record = engine.jobs.get(job.leader()).unwrap();
    assert_eq!(record.state, ProcessState::Running);
    assert_eq!(record.job_id, Some(1));

    kill(job.leader(), Signal::SIGKILL).unwrap();
    let events = reap_events(&mut engine, 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ProcessEventKind::Signaled(Signal::SIGKILL));
    assert_eq!(
        events[0].to_string(),
        format!("sleep with pid {} has exited with signal", job.leader())
    );
    assert!(!engine.jobs.is_active(job.leader()));
}

#[test]
fn test_finished_background_job_is_reported() {
    let _guard = engine_lock();
    let mut engine = Engine::new();

    let job = engine.spawn("true");
    let events = reap_events(&mut engine, 1);

    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].to_string(),
        format!("true with pid {} exited normally", job.leader())
    );
    let record = engine.jobs.get(job.leader()).unwrap();
    assert_eq!(record.state, ProcessState::Reaped);
    assert_eq!(engine.jobs.active_count(), 0);
}

#[test]
fn test_background_pipeline_shares_a_group() {
    let _guard = engine_lock();
    let mut engine = Engine::new();

    let job = engine.spawn("sleep 100 | sleep 100 | sleep 100");
    assert_eq!(job.pids.len(), 3);
    assert_eq!(engine.jobs.active_count(), 3);

    for pid in &job.pids {
        // The child may not have run its own setpgid yet, but the
        // parent's call has already happened.
        assert_eq!(getpgid(Some(*pid)).unwrap(), job.pgid);
        assert_eq!(engine.jobs.get(*pid).unwrap().job_id, Some(job.job_id));
    }

    killpg(job.pgid, Signal::SIGKILL).unwrap();
    let events = reap_events(&mut engine, 3);
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|e| e.kind == ProcessEventKind::Signaled(Signal::SIGKILL)));
    assert_eq!(engine.jobs.active_count(), 0);
}

#[test]
fn test_job_ids_increase() {
    let _guard = engine_lock();
    let mut engine = Engine::new();

    let first = engine.spawn("true");
    let second = engine.spawn("true");
    assert_eq!(first.job_id, 1);
    assert_eq!(second.job_id, 2);

    let events = reap_events(&mut engine, 2);
    assert_eq!(events.len(), 2);
}

#[test]
fn test_stopped_foreground_job_returns_control() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("stop.sh");
    fs::write(&script, "kill -STOP $$\necho resumed\n").unwrap();

    let mut engine = Engine::new();
    let job = engine.run(&format!("sh {}", script.display()));

    assert!(job.stopped());
    let stops: Vec<_> = job.stop_events().collect();
    assert_eq!(stops.len(), 1);
    assert!(stops[0].to_string().ends_with("has stopped!"));

    let pid = job.pids[0];
    let record = engine.jobs.get(pid).unwrap();
    assert_eq!(record.state, ProcessState::Stopped);
    assert!(engine.jobs.is_active(pid));

    kill(pid, Signal::SIGKILL).unwrap();
    let events = reap_events(&mut engine, 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].pid, pid);
    assert_eq!(engine.jobs.get(pid).unwrap().state, ProcessState::Reaped);
}
