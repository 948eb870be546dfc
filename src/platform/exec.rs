// linux-armoury - platform/exec.rs
//
// Subprocess execution with hard deadlines. Every external tool call in
// the app goes through here so a hung vendor binary can never wedge the
// process: children are polled in short slices and killed at the deadline.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::util::constants;
use crate::util::error::ExecError;

/// Captured result of a completed command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Locate an executable on PATH.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// True when the named binary exists on PATH.
pub fn binary_available(name: &str) -> bool {
    find_on_path(name).is_some()
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}

/// Run a command and capture its output, enforcing a deadline.
///
/// Returns the output regardless of exit status; callers that require
/// success use [`run_checked`].
pub fn run(binary: &str, args: &[&str], timeout_ms: u64) -> Result<CommandOutput, ExecError> {
    run_with_env(binary, args, &[], timeout_ms)
}

/// Like [`run`], with extra environment variables set for the child.
pub fn run_with_env(
    binary: &str,
    args: &[&str],
    env: &[(&str, String)],
    timeout_ms: u64,
) -> Result<CommandOutput, ExecError> {
    let command_line = render_command(binary, args);
    trace!(command = %command_line, timeout_ms, "spawning");

    let child = Command::new(binary)
        .args(args)
        .envs(env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ExecError::MissingBinary {
                    name: binary.to_string(),
                }
            } else {
                ExecError::Spawn {
                    command: command_line.clone(),
                    source,
                }
            }
        })?;

    wait_with_deadline(child, &command_line, timeout_ms)
}

/// Run a command and return an error when it exits non-zero.
pub fn run_checked(
    binary: &str,
    args: &[&str],
    timeout_ms: u64,
) -> Result<CommandOutput, ExecError> {
    let output = run(binary, args, timeout_ms)?;
    if output.success() {
        Ok(output)
    } else {
        Err(ExecError::Failed {
            command: render_command(binary, args),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Run a command under pkexec so PolicyKit can prompt for authorization.
///
/// Used for operations that write privileged state (pwrcfg, sysfs nodes,
/// xrandr on some setups).
pub fn run_elevated(
    binary: &str,
    args: &[&str],
    timeout_ms: u64,
) -> Result<CommandOutput, ExecError> {
    let mut full_args: Vec<&str> = Vec::with_capacity(args.len() + 1);
    full_args.push(binary);
    full_args.extend_from_slice(args);
    let output = run(constants::CMD_PKEXEC, &full_args, timeout_ms)?;
    if output.success() {
        Ok(output)
    } else {
        // 126/127 are pkexec's own codes for dismissed / not authorized.
        Err(ExecError::Failed {
            command: format!("{} {}", constants::CMD_PKEXEC, render_command(binary, args)),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

fn wait_with_deadline(
    mut child: Child,
    command_line: &str,
    timeout_ms: u64,
) -> Result<CommandOutput, ExecError> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let slice = Duration::from_millis(constants::EXEC_WAIT_SLICE_MS);

    // Drain both pipes on their own threads while the child runs. A
    // child that writes more than the pipe buffer would otherwise block
    // on write, never exit, and get reported as a timeout.
    let stdout = spawn_drain(child.stdout.take());
    let stderr = spawn_drain(child.stderr.take());

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let code = status.code();
                debug!(command = %command_line, ?code, "command finished");
                return Ok(CommandOutput {
                    stdout: join_drain(stdout),
                    stderr: join_drain(stderr),
                    code,
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    warn!(command = %command_line, timeout_ms, "command timed out, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    // The reader threads finish once the pipes close.
                    join_drain(stdout);
                    join_drain(stderr);
                    return Err(ExecError::Timeout {
                        command: command_line.to_string(),
                        timeout_ms,
                    });
                }
                std::thread::sleep(slice);
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                join_drain(stdout);
                join_drain(stderr);
                return Err(ExecError::Spawn {
                    command: command_line.to_string(),
                    source,
                });
            }
        }
    }
}

fn spawn_drain<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<String>> {
    stream.map(|mut stream| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = stream.read_to_string(&mut buf);
            buf
        })
    })
}

fn join_drain(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn render_command(binary: &str, args: &[&str]) -> String {
    if args.is_empty() {
        binary.to_string()
    } else {
        format!("{} {}", binary, args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let output = run("echo", &["hello"], 5_000).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_missing_binary() {
        let err = run("definitely-not-a-real-binary-xyz", &[], 5_000).unwrap_err();
        assert!(matches!(err, ExecError::MissingBinary { .. }));
    }

    #[test]
    fn test_run_checked_rejects_failure() {
        let err = run_checked("false", &[], 5_000).unwrap_err();
        match err {
            ExecError::Failed { code, .. } => assert_eq!(code, Some(1)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = run("sleep", &["10"], 200).unwrap_err();
        assert!(matches!(err, ExecError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_large_output_does_not_stall_the_child() {
        // More than a pipe buffer's worth of output; the child must
        // still be able to finish well inside the deadline.
        let output = run(
            "sh",
            &["-c", "head -c 200000 /dev/zero | tr '\\0' 'a'"],
            5_000,
        )
        .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 200_000);
    }

    #[test]
    fn test_binary_available() {
        assert!(binary_available("sh"));
        assert!(!binary_available("definitely-not-a-real-binary-xyz"));
    }
}
