//! Helpers for running external tools.
//!
//! Recording steps block on each child until it exits. OCR tooling goes
//! through [`run_command_with_timeout`] so a wedged `ffmpeg` cannot stall a
//! validation run.

use std::io::Read;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Render a command as `program arg1 arg2` for error messages.
pub fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|arg| arg.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run a command to completion, failing on a non-zero exit.
///
/// stdout and stderr are captured; the error carries the trimmed stderr.
pub fn run(cmd: &mut Command) -> Result<Output> {
    let label = describe(cmd);
    debug!(command = %label, "running");
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("spawn {label}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{label} failed ({}): {}",
            exit_label(output.status),
            stderr.trim()
        );
    }
    Ok(output)
}

/// Run a command to completion and return its stdout.
pub fn run_capture(cmd: &mut Command) -> Result<String> {
    let output = run(cmd)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a command with inherited stdio, failing on a non-zero exit.
///
/// Used for long interactive tools (VHS) whose progress the user should see.
pub fn run_inherited(cmd: &mut Command) -> Result<()> {
    let label = describe(cmd);
    debug!(command = %label, "running with inherited stdio");
    let status = cmd.status().with_context(|| format!("spawn {label}"))?;
    if !status.success() {
        bail!("{label} failed ({})", exit_label(status));
    }
    Ok(())
}

/// Names from `commands` that are not found on `PATH`, in order.
pub fn missing_commands(commands: &[&str]) -> Vec<String> {
    commands
        .iter()
        .filter(|name| which::which(name).is_err())
        .map(|name| (*name).to_string())
        .collect()
}

/// Fail with `Missing dependency: <name>` for the first absent command.
pub fn check_dependencies(commands: &[&str]) -> Result<()> {
    if let Some(name) = missing_commands(commands).first() {
        bail!("Missing dependency: {name}");
    }
    Ok(())
}

fn exit_label(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Output of a command run under [`run_command_with_timeout`].
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes read past the output limit and discarded.
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// True when the command exited zero before the timeout.
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}

/// Bytes kept from one output stream, and how many were dropped.
struct Drained {
    kept: Vec<u8>,
    dropped: usize,
}

/// Run `cmd` for at most `timeout`, keeping up to `output_limit_bytes` of
/// each output stream.
///
/// Both pipes are drained on their own threads while the child runs, so a
/// chatty `ffmpeg` cannot block on a full pipe. A child still running at the
/// deadline is killed and reported with `timed_out`.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    let label = describe(&cmd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(command = %label, "spawning with timeout");
    let mut child = cmd.spawn().map_err(|err| {
        error!(err = %err, command = %label, "spawn failed");
        anyhow!(err).context(format!("spawn {label}"))
    })?;

    let stdout = drain_in_background(child.stdout.take(), output_limit_bytes)?;
    let stderr = drain_in_background(child.stderr.take(), output_limit_bytes)?;

    let (status, timed_out) = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => (status, false),
        None => {
            warn!(command = %label, timeout_secs = timeout.as_secs(), "timed out, killing");
            child.kill().context("kill command")?;
            (child.wait().context("reap killed command")?, true)
        }
    };

    let stdout = finish_drain(stdout).context("collect stdout")?;
    let stderr = finish_drain(stderr).context("collect stderr")?;
    if stdout.dropped > 0 || stderr.dropped > 0 {
        warn!(
            command = %label,
            stdout_truncated = stdout.dropped,
            stderr_truncated = stderr.dropped,
            "output over limit"
        );
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout: stdout.kept,
        stderr: stderr.kept,
        stdout_truncated: stdout.dropped,
        stderr_truncated: stderr.dropped,
        timed_out,
    })
}

fn drain_in_background<R>(
    stream: Option<R>,
    limit: usize,
) -> Result<thread::JoinHandle<Result<Drained>>>
where
    R: Read + Send + 'static,
{
    let stream = stream.ok_or_else(|| anyhow!("child output was not piped"))?;
    Ok(thread::spawn(move || drain_limited(stream, limit)))
}

fn finish_drain(handle: thread::JoinHandle<Result<Drained>>) -> Result<Drained> {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow!("output reader thread panicked")))
}

/// Read `reader` to EOF, keeping the first `limit` bytes.
fn drain_limited<R: Read>(mut reader: R, limit: usize) -> Result<Drained> {
    let mut drained = Drained {
        kept: Vec::new(),
        dropped: 0,
    };
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            return Ok(drained);
        }
        let keep = n.min(limit.saturating_sub(drained.kept.len()));
        drained.kept.extend_from_slice(&chunk[..keep]);
        drained.dropped += n - keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_reports_command_and_stderr_on_failure() {
        let err = run(Command::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .expect_err("non-zero exit");
        let msg = err.to_string();
        assert!(msg.contains("sh -c"), "{msg}");
        assert!(msg.contains("exit code 3"), "{msg}");
        assert!(msg.ends_with("boom"), "{msg}");
    }

    #[test]
    fn run_capture_returns_stdout() {
        let out = run_capture(Command::new("sh").args(["-c", "printf hello"])).expect("run");
        assert_eq!(out, "hello");
    }

    #[test]
    fn missing_commands_lists_only_absent_tools() {
        let missing = missing_commands(&["sh", "definitely-not-a-real-tool-xyz"]);
        assert_eq!(missing, vec!["definitely-not-a-real-tool-xyz"]);
        let err = check_dependencies(&["definitely-not-a-real-tool-xyz"]).expect_err("missing");
        assert_eq!(err.to_string(), "Missing dependency: definitely-not-a-real-tool-xyz");
        check_dependencies(&["sh"]).expect("sh present");
    }

    #[test]
    fn timeout_kills_slow_commands() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 5"]);
        let output =
            run_command_with_timeout(cmd, Duration::from_millis(100), 1024).expect("run");
        assert!(output.timed_out);
        assert!(!output.succeeded());
    }

    #[test]
    fn drain_keeps_prefix_and_counts_the_rest() {
        let drained = drain_limited(&b"0123456789"[..], 3).expect("drain");
        assert_eq!(drained.kept, b"012");
        assert_eq!(drained.dropped, 7);
    }

    #[test]
    fn output_is_bounded() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf abcdef"]);
        let output = run_command_with_timeout(cmd, Duration::from_secs(5), 4).expect("run");
        assert!(output.succeeded());
        assert_eq!(output.stdout, b"abcd");
        assert_eq!(output.stdout_truncated, 2);
    }
}
