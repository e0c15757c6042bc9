//! Shared subprocess runner for analyzer tools
//!
//! Every external tool goes through [`ProcessRunner::run`]: spawn with piped
//! stdio, enforce a per-batch deadline, race the job's cancellation token,
//! and collect stdout/stderr in full. Aborted processes get the gentle
//! termination signal first and are force-killed after a grace window.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Captured result of a finished subprocess
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process died on a signal
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Why a subprocess produced no usable output
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exceeded its {}s deadline", deadline.as_secs())]
    DeadlineExceeded { command: String, deadline: Duration },

    #[error("`{command}` was cancelled")]
    Cancelled { command: String },
}

/// Spawns analyzer subprocesses with deadline and cancellation handling
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Window between SIGTERM and SIGKILL when aborting
    grace: Duration,
}

impl ProcessRunner {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Run `cmd` to completion, within `deadline`, aborting on `cancel`.
    ///
    /// `label` names the command in errors and logs.
    pub async fn run(
        &self,
        label: &str,
        mut cmd: Command,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: label.to_string(),
            source,
        })?;

        // Drain the pipes concurrently with waiting so a chatty tool cannot
        // fill the pipe buffer and deadlock against our wait().
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let status = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => status,
                Err(source) => {
                    return Err(ProcessError::Spawn { command: label.to_string(), source });
                }
            },
            _ = tokio::time::sleep(deadline) => {
                warn!(command = label, deadline_secs = deadline.as_secs(), "analyzer deadline exceeded, terminating");
                self.terminate(&mut child).await;
                drain(stdout_task, stderr_task).await;
                return Err(ProcessError::DeadlineExceeded { command: label.to_string(), deadline });
            }
            _ = cancel.cancelled() => {
                debug!(command = label, "cancellation requested, terminating analyzer");
                self.terminate(&mut child).await;
                drain(stdout_task, stderr_task).await;
                return Err(ProcessError::Cancelled { command: label.to_string() });
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        Ok(ProcessOutput {
            status_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Gentle termination, escalating to a forced kill after the grace
    /// window.
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            if tokio::time::timeout(self.grace, child.wait()).await.is_ok() {
                return;
            }
            warn!(pid, grace_secs = self.grace.as_secs(), "analyzer ignored SIGTERM, killing");
        }

        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

async fn drain(
    stdout_task: tokio::task::JoinHandle<Vec<u8>>,
    stderr_task: tokio::task::JoinHandle<Vec<u8>>,
) {
    let _ = stdout_task.await;
    let _ = stderr_task.await;
}
