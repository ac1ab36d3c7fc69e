//! Subprocess Runner (C1): spawns a git process, collects stdout/stderr and
//! exit code, and honors an optional deadline and an optional cancellation
//! flag. Never raises for a non-zero exit — classification is the caller's
//! job.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::env_config::debug_enabled;

/// Result of running one subprocess to completion, to a deadline, or to
/// cancellation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && !self.cancelled && self.exit_code == Some(0)
    }
}

/// Cooperative cancellation signal shared across one outer operation (e.g.
/// one `Parallel Executor` batch). Cloned cheaply; `cancel()` is idempotent.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run `git <args>` in `cwd`, with additional `env` overrides, an optional
/// `timeout`, and an optional cancellation token polled while waiting.
///
/// `context` is a short human label used only for the `[sq-trace]` debug log
/// line and, when `SIDE_QUEST_DEBUG=1`, the JSON debug event emitted to
/// stderr.
pub fn run_git(
    args: &[&str],
    cwd: &Path,
    env: &[(&str, &str)],
    timeout: Option<Duration>,
    cancel: Option<&CancelToken>,
    context: &str,
) -> RunOutput {
    let start = Instant::now();
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in env {
        cmd.env(k, v);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return RunOutput {
                stdout: String::new(),
                stderr: format!("failed to spawn git: {e}"),
                exit_code: None,
                timed_out: false,
                cancelled: false,
            };
        }
    };

    // Drain stdout/stderr on dedicated reader threads started before the
    // wait loop, the same shape as the teacher's reader-thread pattern
    // (`git/repository/mod.rs`). Reading post-wait instead would let a
    // child that fills the OS pipe buffer (e.g. `worktree list` on a large
    // repo) block on write forever while this function sits in its poll
    // loop never touching the pipes — a hang with no deadline, since the
    // `timeout = None` call sites never reach `wait_slice`'s zero check.
    let stdout_reader = child.stdout.take().map(|mut pipe| {
        std::thread::spawn(move || {
            use std::io::Read;
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            use std::io::Read;
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });
    let join_readers = |stdout_reader: Option<std::thread::JoinHandle<String>>,
                         stderr_reader: Option<std::thread::JoinHandle<String>>| {
        let stdout = stdout_reader.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr_reader.and_then(|h| h.join().ok()).unwrap_or_default();
        (stdout, stderr)
    };

    let poll_interval = Duration::from_millis(20);
    let deadline = timeout.map(|d| start + d);
    let status = loop {
        if let Some(token) = cancel
            && token.is_cancelled()
        {
            let _ = child.kill();
            let _ = child.wait();
            join_readers(stdout_reader, stderr_reader);
            log::debug!(
                "[sq-trace] context={context} cmd=\"git {}\" dur={:.1}ms ok=false cancelled=true",
                args.join(" "),
                start.elapsed().as_secs_f64() * 1000.0
            );
            return RunOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: None,
                timed_out: false,
                cancelled: true,
            };
        }

        let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
        let wait_slice = match remaining {
            Some(r) if r.is_zero() => {
                let _ = child.kill();
                let _ = child.wait();
                join_readers(stdout_reader, stderr_reader);
                log::debug!(
                    "[sq-trace] context={context} cmd=\"git {}\" dur={:.1}ms ok=false timed_out=true",
                    args.join(" "),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                return RunOutput {
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: None,
                    timed_out: true,
                    cancelled: false,
                };
            }
            Some(r) => r.min(poll_interval),
            None => poll_interval,
        };

        match child.wait_timeout(wait_slice) {
            Ok(Some(status)) => break status,
            Ok(None) => continue,
            Err(e) => {
                join_readers(stdout_reader, stderr_reader);
                return RunOutput {
                    stdout: String::new(),
                    stderr: format!("failed to wait on git: {e}"),
                    exit_code: None,
                    timed_out: false,
                    cancelled: false,
                };
            }
        }
    };

    let (stdout, stderr) = join_readers(stdout_reader, stderr_reader);

    let dur = start.elapsed();
    log::debug!(
        "[sq-trace] context={context} cmd=\"git {}\" dur={:.1}ms ok={}",
        args.join(" "),
        dur.as_secs_f64() * 1000.0,
        status.success()
    );

    if debug_enabled() {
        emit_debug_event(context, args, dur, status.code());
    }

    RunOutput {
        stdout,
        stderr,
        exit_code: status.code(),
        timed_out: false,
        cancelled: false,
    }
}

fn emit_debug_event(context: &str, args: &[&str], dur: Duration, exit_code: Option<i32>) {
    let event = serde_json::json!({
        "event": "subprocess",
        "ts": crate::utils::now_iso8601(),
        "context": context,
        "args": args,
        "dur_ms": dur.as_secs_f64() * 1000.0,
        "exit_code": exit_code,
    });
    eprintln!("{event}");
}
