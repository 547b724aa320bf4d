//! Detached process spawning and instance termination.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::lifecycle::pidfile::read_pid;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Start `program` in its own process group with stdio discarded.
///
/// Returns the child's pid; the child is not waited on.
pub fn spawn_detached(program: &str, args: &[String]) -> io::Result<u32> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd.spawn()?;
    tracing::debug!(program, pid = child.id(), "Detached process started");
    Ok(child.id())
}

/// Outcome of asking a running instance to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No PID file, nothing to stop.
    NotRunning,
    /// The instance removed its PID file after SIGTERM.
    Stopped,
    /// The PID file named a process that no longer exists.
    Stale,
    /// The instance did not exit within the timeout.
    TimedOut,
}

/// Send SIGTERM to the instance recorded in `pid_file` and wait for it to
/// remove the file.
pub async fn stop_instance(pid_file: &Path, timeout: Duration) -> io::Result<StopOutcome> {
    let Some(pid) = read_pid(pid_file)? else {
        return Ok(StopOutcome::NotRunning);
    };

    if pid == std::process::id() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "refusing to signal the current process",
        ));
    }

    if !terminate(pid)? {
        tracing::warn!(pid, path = %pid_file.display(), "Removing stale PID file");
        let _ = std::fs::remove_file(pid_file);
        return Ok(StopOutcome::Stale);
    }
    tracing::info!(pid, "Sent SIGTERM to running instance");

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !pid_file.exists() {
            return Ok(StopOutcome::Stopped);
        }
        tokio::time::sleep(STOP_POLL_INTERVAL).await;
    }
    Ok(StopOutcome::TimedOut)
}

/// Returns `Ok(false)` when no such process exists.
#[cfg(unix)]
fn terminate(pid: u32) -> io::Result<bool> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "pid out of range"))?;
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn terminate(_pid: u32) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "stopping a running instance requires a unix platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stop_without_pid_file() {
        let temp_dir = TempDir::new().unwrap();
        let outcome = stop_instance(&temp_dir.path().join("none.pid"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, StopOutcome::NotRunning);
    }

    #[tokio::test]
    async fn test_refuses_to_stop_self() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("self.pid");
        std::fs::write(&path, std::process::id().to_string()).unwrap();

        assert!(stop_instance(&path, Duration::from_secs(1)).await.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_detached_runs_program() {
        let pid = spawn_detached("true", &[]).unwrap();
        assert!(pid > 0);
    }

    #[test]
    fn test_spawn_detached_missing_program() {
        assert!(spawn_detached("definitely-not-a-real-binary-7f3a", &[]).is_err());
    }
}
