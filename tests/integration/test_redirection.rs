//! Integration Tests for Redirection
//!
//! These tests verify `<`, `>` and `>>` on the ends of a pipeline.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use mosaicsh::execution::EXIT_REDIRECT_FAILED;
use std::fs;
use tempfile::TempDir;
use test_utils::{engine_lock, read_trimmed, Engine};

#[test]
fn test_truncate_then_append() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("log");
    fs::write(&out, "stale contents\n").unwrap();

    let mut engine = Engine::new();
    engine.run(&format!("echo one > {}", out.display()));
    assert_eq!(fs::read_to_string(&out).unwrap(), "one\n");

    engine.run(&format!("echo two >> {}", out.display()));
    assert_eq!(fs::read_to_string(&out).unwrap(), "one\ntwo\n");
}

#[test]
fn test_append_creates_missing_file() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("fresh");

    let mut engine = Engine::new();
    let job = engine.run(&format!("echo first >> {}", out.display()));
    assert_eq!(job.status(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "first\n");
}

#[test]
fn test_input_redirect() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    fs::write(&input, "a\nb\nc\nd\n").unwrap();

    let mut engine = Engine::new();
    engine.run(&format!("wc -l < {} > {}", input.display(), out.display()));
    assert_eq!(read_trimmed(&out), "4");
}

#[test]
fn test_output_before_input_redirect() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("unsorted");
    let out = dir.path().join("sorted");
    fs::write(&input, "pear\napple\nfig\n").unwrap();

    let mut engine = Engine::new();
    let job = engine.run(&format!("sort > {} < {}", out.display(), input.display()));
    assert_eq!(job.status(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "apple\nfig\npear\n");
}

#[test]
fn test_redirects_on_both_pipeline_ends() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("words");
    let out = dir.path().join("picked");
    fs::write(&input, "alpha\nbeta\ngamma\n").unwrap();

    let mut engine = Engine::new();
    engine.run(&format!(
        "grep a < {} | sort -r > {}",
        input.display(),
        out.display()
    ));
    assert_eq!(fs::read_to_string(&out).unwrap(), "gamma\nbeta\nalpha\n");
}

#[test]
fn test_missing_input_file_fails_the_stage() {
    let _guard = engine_lock();
    let mut engine = Engine::new();

    let job = engine.run("cat < /nonexistent/mosaicsh-input");
    assert_eq!(job.status(), EXIT_REDIRECT_FAILED);
    assert_eq!(engine.jobs.active_count(), 0);
}

#[test]
fn test_unwritable_output_fails_the_stage() {
    let _guard = engine_lock();
    let mut engine = Engine::new();

    let job = engine.run("echo x > /nonexistent/dir/f");
    assert_eq!(job.status(), EXIT_REDIRECT_FAILED);
}
