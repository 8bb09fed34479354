//! Integration Tests for Pipelines
//!
//! These tests run real pipelines through the orchestrator and check
//! stage wiring, process groups and reaping.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use mosaicsh::models::ProcessState;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use test_utils::{engine_lock, read_trimmed, Engine};

#[test]
fn test_two_stage_pipeline_with_output_redirect() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let listing = dir.path().join("listing");
    fs::create_dir(&listing).unwrap();
    for name in ["a", "b", "c"] {
        fs::write(listing.join(name), "x").unwrap();
    }
    let out = dir.path().join("count");

    let mut engine = Engine::new();
    let job = engine.run(&format!("ls {} | wc -l > {}", listing.display(), out.display()));

    assert_eq!(job.status(), 0);
    assert_eq!(job.pids.len(), 2);
    assert_eq!(read_trimmed(&out), "3");
}

#[test]
fn test_every_stage_shares_one_group_and_is_reaped() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("bytes");

    let mut engine = Engine::new();
    let job = engine.run(&format!("echo hi | cat | cat | wc -c > {}", out.display()));

    assert_eq!(job.pids.len(), 4);
    assert_eq!(job.events.len(), 4);
    assert_eq!(job.pgid, job.pids[0]);
    assert_eq!(read_trimmed(&out), "3");

    let group = engine.jobs.records_in_group(job.pgid);
    assert_eq!(group.len(), 4);
    for record in group {
        assert_eq!(record.pgid, job.pgid);
        assert_eq!(record.state, ProcessState::Reaped);
    }
    assert_eq!(engine.jobs.active_count(), 0);

    // Nothing is left for anybody else to collect
    for pid in &job.pids {
        assert_eq!(
            waitpid(*pid, Some(WaitPidFlag::WNOHANG)).unwrap_err(),
            Errno::ECHILD
        );
    }
}

#[test]
fn test_status_comes_from_last_stage() {
    let _guard = engine_lock();
    let mut engine = Engine::new();

    assert_eq!(engine.run("true | false").status(), 1);
    assert_eq!(engine.run("false | true").status(), 0);
}

#[test]
fn test_single_command_output_is_captured() {
    let _guard = engine_lock();
    let mut engine = Engine::with_capture(true);

    let job = engine.run("echo hello");
    assert_eq!(job.captured.as_deref(), Some(&b"hello\n"[..]));
}

#[test]
fn test_capture_returns_when_a_descendant_keeps_stdout() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("daemon.sh");
    fs::write(&script, "sleep 5 &\necho spawned\n").unwrap();

    let mut engine = Engine::with_capture(true);
    let started = Instant::now();
    let job = engine.run(&format!("sh {}", script.display()));
    let elapsed = started.elapsed();

    // The left-behind sleep is still in the job's group
    let _ = killpg(job.pgid, Signal::SIGKILL);

    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    assert_eq!(job.status(), 0);
    assert_eq!(job.captured.as_deref(), Some(&b"spawned\n"[..]));
}

#[test]
fn test_pipelines_are_not_captured() {
    let _guard = engine_lock();
    let mut engine = Engine::with_capture(true);

    let job = engine.run("echo hello | cat");
    assert!(job.captured.is_none());
    assert_eq!(job.status(), 0);
}

#[test]
fn test_glob_expands_before_exec() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("one.txt"), "1\n").unwrap();
    fs::write(dir.path().join("two.txt"), "2\n").unwrap();
    fs::write(dir.path().join("skip.md"), "9\n").unwrap();
    let out = dir.path().join("joined");

    let mut engine = Engine::new();
    let job = engine.run(&format!(
        "cat {}/*.txt > {}",
        dir.path().display(),
        out.display()
    ));

    assert_eq!(job.status(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "1\n2\n");
}
