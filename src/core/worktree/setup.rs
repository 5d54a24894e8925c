//! Running the configured setup commands inside a new worktree.

use crate::core::CancelToken;
use crate::error::{GwtError, Result};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How much of each command's execution is written to the trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupOptions {
    /// Stream command output lines as they arrive.
    pub verbose: bool,
    /// Print each command and how long it took.
    pub timed: bool,
}

impl SetupOptions {
    fn traces(self) -> bool {
        self.verbose || self.timed
    }
}

/// Run `commands` in order inside `workdir`, stopping at the first failure.
///
/// With `verbose` or `timed`, writes `→ <command>` before each command and
/// `✓ done in <d>` or `✗ failed in <d>` after it; `verbose` also forwards
/// every output line. Otherwise output is only kept for the error.
pub fn run_setup_commands(
    workdir: &Path,
    commands: &[String],
    opts: SetupOptions,
    out: &mut dyn Write,
    cancel: &CancelToken,
) -> Result<()> {
    for command in commands {
        if opts.traces() {
            trace(out, &format!("→ {command}"));
        }
        let start = Instant::now();
        let result = run_shell_command(command, workdir, cancel, |line| {
            if opts.verbose {
                trace(out, line);
            }
        });
        match result {
            Ok(elapsed) => {
                if opts.traces() {
                    trace(out, &format!("✓ done in {}", format_duration(elapsed)));
                }
            }
            Err(e) => {
                if opts.traces() {
                    trace(
                        out,
                        &format!("✗ failed in {}", format_duration(start.elapsed())),
                    );
                }
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Run one command with `sh -c` in `workdir` and return how long it took.
///
/// stdin is closed; stdout and stderr are captured by reader threads and
/// each line is passed to `on_line` as it arrives. A non-zero exit becomes
/// [`GwtError::SetupCommand`] carrying the captured output. When `cancel`
/// fires the child is killed and [`GwtError::Cancelled`] is returned.
pub fn run_shell_command(
    command: &str,
    workdir: &Path,
    cancel: &CancelToken,
    mut on_line: impl FnMut(&str),
) -> Result<Duration> {
    if cancel.is_cancelled() {
        return Err(GwtError::Cancelled);
    }

    let start = Instant::now();
    tracing::debug!(%command, workdir = %workdir.display(), "running setup command");

    let mut cmd = Command::new("sh");
    cmd.args(["-c", command])
        .current_dir(workdir)
        // A child waiting on input would hang the run.
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group, so cancellation reaches everything `sh` starts.
        cmd.process_group(0);
    }
    let mut child = cmd
        .spawn()
        .map_err(|e| GwtError::io(format!("failed to spawn '{command}'"), e))?;

    let (tx, rx) = mpsc::channel::<String>();
    let stdout_thread = spawn_reader(child.stdout.take(), tx.clone());
    let stderr_thread = spawn_reader(child.stderr.take(), tx);

    let pid = child.id();
    let status = match wait_for_exit(&mut child, cancel, &rx, &mut on_line) {
        Ok(status) => status,
        // Reader threads finish on their own once the pipes close.
        Err(WaitError::Cancelled) => return Err(GwtError::Cancelled),
        Err(WaitError::Io(e)) => {
            return Err(GwtError::io(format!("failed to wait for '{command}'"), e));
        }
    };

    // Background jobs started by `sh` keep the pipes open after it exits.
    if drain_output(pid, cancel, &rx, &mut on_line).is_err() {
        return Err(GwtError::Cancelled);
    }

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    if status.success() {
        Ok(start.elapsed())
    } else {
        Err(GwtError::SetupCommand {
            command: command.to_string(),
            code: status.code(),
            output: format!("{stdout}{stderr}"),
        })
    }
}

enum WaitError {
    Cancelled,
    Io(std::io::Error),
}

/// Poll the child until it exits, forwarding output lines while waiting.
fn wait_for_exit(
    child: &mut Child,
    cancel: &CancelToken,
    rx: &mpsc::Receiver<String>,
    on_line: &mut impl FnMut(&str),
) -> std::result::Result<ExitStatus, WaitError> {
    loop {
        if let Some(status) = child.try_wait().map_err(WaitError::Io)? {
            return Ok(status);
        }
        if cancel.is_cancelled() {
            kill_tree(child);
            return Err(WaitError::Cancelled);
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => on_line(&line),
            Err(RecvTimeoutError::Timeout) => {}
            // Both pipes closed but the process is still running.
            Err(RecvTimeoutError::Disconnected) => thread::sleep(POLL_INTERVAL),
        }
    }
}

/// Forward output until both pipes close. Kills the command's process group
/// and fails if `cancel` fires first.
fn drain_output(
    pid: u32,
    cancel: &CancelToken,
    rx: &mpsc::Receiver<String>,
    on_line: &mut impl FnMut(&str),
) -> std::result::Result<(), WaitError> {
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => on_line(&line),
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
            Err(RecvTimeoutError::Timeout) => {}
        }
        if cancel.is_cancelled() {
            kill_group(pid);
            return Err(WaitError::Cancelled);
        }
    }
}

fn kill_tree(child: &mut Child) {
    kill_group(child.id());
    child.kill().ok();
    child.wait().ok();
}

fn kill_group(pid: u32) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(pid) {
            // SAFETY: plain syscall on a process group this process created.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

fn spawn_reader<R>(pipe: Option<R>, tx: mpsc::Sender<String>) -> thread::JoinHandle<String>
where
    R: std::io::Read + Send + 'static,
{
    thread::spawn(move || {
        let mut content = String::new();
        if let Some(pipe) = pipe {
            for line in BufReader::new(pipe).lines().map_while(std::io::Result::ok) {
                tx.send(line.clone()).ok();
                content.push_str(&line);
                content.push('\n');
            }
        }
        content
    })
}

fn trace(out: &mut dyn Write, line: &str) {
    let _ = writeln!(out, "{line}");
    let _ = out.flush();
}

/// Render a duration rounded to milliseconds: `850ms`, `1.25s`, `2m3.5s`.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        return format!("{ms}ms");
    }
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) as f64 / 1000.0;
    let seconds = format!("{seconds:.3}");
    let seconds = seconds.trim_end_matches('0').trim_end_matches('.');
    if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cmds(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1s");
        assert_eq!(format_duration(Duration::from_millis(1250)), "1.25s");
        assert_eq!(format_duration(Duration::from_millis(123_500)), "2m3.5s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m0s");
    }

    #[test]
    fn test_run_shell_command_success_streams_lines() {
        let dir = tempdir().unwrap();
        let mut lines = Vec::new();
        run_shell_command("echo one; echo two >&2", dir.path(), &CancelToken::new(), |l| {
            lines.push(l.to_string())
        })
        .unwrap();
        lines.sort();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_run_shell_command_runs_in_workdir() {
        let dir = tempdir().unwrap();
        run_shell_command("touch marker", dir.path(), &CancelToken::new(), |_| {}).unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_run_shell_command_failure_carries_output() {
        let dir = tempdir().unwrap();
        let err = run_shell_command("echo boom; exit 3", dir.path(), &CancelToken::new(), |_| {})
            .unwrap_err();
        match err {
            GwtError::SetupCommand {
                command,
                code,
                output,
            } => {
                assert_eq!(command, "echo boom; exit 3");
                assert_eq!(code, Some(3));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = tempdir().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run_shell_command("touch marker", dir.path(), &cancel, |_| {}).unwrap_err();
        assert!(matches!(err, GwtError::Cancelled));
        assert!(!dir.path().join("marker").exists());
    }

    #[test]
    fn test_cancel_kills_running_command() {
        let dir = tempdir().unwrap();
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            trigger.cancel();
        });

        let start = Instant::now();
        let err = run_shell_command("sleep 30", dir.path(), &cancel, |_| {}).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, GwtError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_cancel_kills_background_job() {
        let dir = tempdir().unwrap();
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            trigger.cancel();
        });

        let start = Instant::now();
        let mut lines = Vec::new();
        let err = run_shell_command("sleep 30 & echo started", dir.path(), &cancel, |l| {
            lines.push(l.to_string())
        })
        .unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, GwtError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(lines, vec!["started"]);
    }

    #[test]
    fn test_background_job_output_is_kept() {
        let dir = tempdir().unwrap();
        let mut lines = Vec::new();
        let command = "(sleep 0.3; echo late) & echo early";
        run_shell_command(command, dir.path(), &CancelToken::new(), |l| {
            lines.push(l.to_string())
        })
        .unwrap();
        assert_eq!(lines, vec!["early", "late"]);
    }

    #[test]
    fn test_setup_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let err = run_setup_commands(
            dir.path(),
            &cmds(&["echo A > a.txt", "false", "echo B > b.txt"]),
            SetupOptions::default(),
            &mut out,
            &CancelToken::new(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("'false'"));
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("b.txt").exists());
        assert!(out.is_empty());
    }

    #[test]
    fn test_setup_timed_trace() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        run_setup_commands(
            dir.path(),
            &cmds(&["echo hidden"]),
            SetupOptions {
                verbose: false,
                timed: true,
            },
            &mut out,
            &CancelToken::new(),
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("→ echo hidden\n"));
        assert!(text.contains("✓ done in "));
        assert!(!text.contains("hidden\n✓"));
    }

    #[test]
    fn test_setup_verbose_streams_output() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        run_setup_commands(
            dir.path(),
            &cmds(&["echo streamed"]),
            SetupOptions {
                verbose: true,
                timed: false,
            },
            &mut out,
            &CancelToken::new(),
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("→ echo streamed"));
        assert!(text.contains("\nstreamed\n"));
        assert!(text.contains("✓ done in "));
    }

    #[test]
    fn test_setup_failure_trace() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        run_setup_commands(
            dir.path(),
            &cmds(&["exit 1"]),
            SetupOptions {
                verbose: false,
                timed: true,
            },
            &mut out,
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(String::from_utf8(out).unwrap().contains("✗ failed in "));
    }
}
