//! Integration Tests for Shell Sessions
//!
//! These tests drive whole command lines through a detached shell:
//! sequencing, history and recall, builtins and signal handling.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use mosaicsh::{Control, Shell};
use nix::sys::signal::{raise, Signal};
use std::fs;
use std::process::{Command, Stdio};
use tempfile::TempDir;
use test_utils::{engine_lock, test_config};

fn shell() -> Shell {
    Shell::detached(&test_config()).unwrap()
}

#[test]
fn test_units_run_in_order() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("order");

    let mut shell = shell();
    let line = format!(
        "echo first >> {0}; echo second >> {0} ; echo third >> {0}",
        out.display()
    );
    assert_eq!(shell.execute_line(&line), Control::Continue);
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "first\nsecond\nthird\n"
    );
    assert_eq!(shell.history().len(), 3);
}

#[test]
fn test_history_keeps_last_ten() {
    let _guard = engine_lock();
    let mut shell = shell();

    for i in 1..=12 {
        shell.execute_line(&format!("echo {}", i));
    }

    let entries: Vec<&str> = shell.history().entries().collect();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0], "echo 3");
    assert_eq!(entries[9], "echo 12");
    assert!(shell.history().render().starts_with("Command History:\n1: echo 3\n"));
}

#[test]
fn test_recall_runs_most_recent_match() {
    let _guard = engine_lock();
    let mut shell = shell();

    shell.execute_line("echo alpha");
    shell.execute_line("echo beta");
    shell.execute_line("!ec");

    assert_eq!(shell.last_status(), 0);
    assert_eq!(shell.last_output(), Some(&b"beta\n"[..]));

    // The recall itself is recorded; the recalled text is not
    let entries: Vec<&str> = shell.history().entries().collect();
    assert_eq!(entries, vec!["echo alpha", "echo beta", "!ec"]);
}

#[test]
fn test_recall_without_match_fails_the_unit() {
    let _guard = engine_lock();
    let mut shell = shell();

    shell.execute_line("echo alpha");
    assert_eq!(shell.execute_line("!zzz"), Control::Continue);
    assert_eq!(shell.last_status(), 1);

    // Later units on the line still run
    shell.execute_line("!nothing; echo still");
    assert_eq!(shell.last_status(), 0);
    assert_eq!(shell.last_output(), Some(&b"still\n"[..]));
}

#[test]
fn test_cd_and_back() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let target = dir.path().canonicalize().unwrap();

    let mut shell = shell();
    let base = shell.session().base_dir().to_path_buf();

    shell.execute_line(&format!("cd {}", target.display()));
    assert_eq!(shell.session().cwd(), target.as_path());
    assert_eq!(std::env::current_dir().unwrap(), target);

    shell.execute_line("cd");
    assert_eq!(shell.session().cwd(), base.as_path());
    assert_eq!(shell.session().display_cwd(), "~");
}

#[test]
fn test_cd_to_missing_directory_keeps_cwd() {
    let _guard = engine_lock();
    let mut shell = shell();
    let before = shell.session().cwd().to_path_buf();

    shell.execute_line("cd /nonexistent/mosaicsh-dir");
    assert_eq!(shell.last_status(), 1);
    assert_eq!(shell.session().cwd(), before.as_path());
}

#[test]
fn test_prompt_builtin() {
    let _guard = engine_lock();
    let mut shell = shell();

    shell.execute_line("prompt mosaic$");
    assert_eq!(shell.session().prompt(), "mosaic$");
    assert_eq!(shell.session().render_prompt(), "mosaic$ ");

    shell.execute_line("prompt");
    assert_eq!(shell.session().prompt(), "mosaic$");
}

#[test]
fn test_exit_stops_the_line() {
    let _guard = engine_lock();
    let mut shell = shell();

    assert_eq!(shell.execute_line("exit; echo after"), Control::Exit);
    let entries: Vec<&str> = shell.history().entries().collect();
    assert_eq!(entries, vec!["exit"]);
}

#[test]
fn test_interrupt_does_not_kill_the_shell() {
    let _guard = engine_lock();
    let mut shell = shell();

    raise(Signal::SIGINT).unwrap();

    // Still here, and still able to run commands
    shell.execute_line("echo alive");
    assert_eq!(shell.last_output(), Some(&b"alive\n"[..]));
}

#[test]
fn test_interrupted_child_reports_signal_status() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("interrupt.sh");
    fs::write(&script, "kill -INT $$\nsleep 5\n").unwrap();

    let mut shell = shell();
    shell.execute_line(&format!("sh {}", script.display()));
    assert_eq!(shell.last_status(), 130);
}

#[test]
fn test_background_unit_is_reported_by_poll() {
    let _guard = engine_lock();
    let mut shell = shell();

    shell.execute_line("true &");
    assert_eq!(shell.jobs().active_count() + shell.jobs().retired().count(), 1);

    let mut events = Vec::new();
    test_utils::wait_until(std::time::Duration::from_secs(5), || {
        events.extend(shell.poll_jobs());
        !events.is_empty()
    });
    assert_eq!(events.len(), 1);
    assert!(events[0].to_string().ends_with("exited normally"));
}

#[test]
fn test_command_mode_exits_with_last_status() {
    let _guard = engine_lock();
    let status = Command::new(env!("CARGO_BIN_EXE_mosaicsh"))
        .args(["-c", "true; false"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

/// Run `mosaicsh -c line` as a session leader with a fresh pty as its
/// controlling terminal
#[cfg(target_os = "linux")]
fn run_on_pty(line: &str) -> std::process::ExitStatus {
    use nix::pty::openpty;
    use nix::unistd::setsid;
    use std::io;
    use std::os::unix::process::CommandExt;

    let pty = openpty(None, None).unwrap();
    let mut command = Command::new(env!("CARGO_BIN_EXE_mosaicsh"));
    command
        .args(["-c", line])
        .stdin(Stdio::from(pty.slave.try_clone().unwrap()))
        .stdout(Stdio::from(pty.slave.try_clone().unwrap()))
        .stderr(Stdio::from(pty.slave));
    // SAFETY: setsid and ioctl are async-signal-safe.
    unsafe {
        command.pre_exec(|| {
            setsid().map_err(io::Error::from)?;
            if nix::libc::ioctl(0, nix::libc::TIOCSCTTY, 0) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
    let status = command.status().unwrap();
    drop(pty.master);
    status
}

#[cfg(target_os = "linux")]
#[test]
fn test_command_mode_hands_terminal_to_job() {
    let _guard = engine_lock();
    let dir = TempDir::new().unwrap();
    let stat = dir.path().join("stat");
    let script = dir.path().join("owner.sh");
    fs::write(&script, format!("cat /proc/$$/stat > {}\n", stat.display())).unwrap();

    let status = run_on_pty(&format!("sh {}", script.display()));
    assert!(status.success(), "{:?}", status);

    // Fields after the command name: state ppid pgrp session tty_nr tpgid
    let text = fs::read_to_string(&stat).unwrap();
    let fields: Vec<&str> = text[text.rfind(')').unwrap() + 1..]
        .split_whitespace()
        .collect();
    assert_eq!(fields[2], fields[5], "job group does not own the terminal");
}
