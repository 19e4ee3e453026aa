//! The command-execution seam between the scheduler and the OS.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{
    error::{Result, TerminalError},
    truncate,
    types::{ExecOptions, ExecResult},
};

/// Runs one job command to completion.
///
/// Implementations must be cancel-safe: dropping the returned future stops
/// the work (the scheduler does so when a job is stopped mid-command).
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<ExecResult>;
}

/// Executes commands through `<shell> -c`, capturing stdout and stderr.
///
/// No timeout is applied: a command that hangs holds up only the job that
/// issued it.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    options: ExecOptions,
}

impl ShellExecutor {
    pub fn new(options: ExecOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str) -> Result<ExecResult> {
        debug!(shell = %self.options.shell, "exec: {command}");

        // kill_on_drop: a stopped job must not leave its child running.
        let child = Command::new(&self.options.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TerminalError::Spawn(format!("{}: {e}", self.options.shell)))?;

        let output = child.wait_with_output().await?;
        let max = self.options.max_output_chars;

        Ok(ExecResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: truncate::clip(&strip_text(&output.stdout), max).into_owned(),
            stderr: truncate::clip(&strip_text(&output.stderr), max).into_owned(),
        })
    }
}

/// Strip ANSI escape codes and convert bytes to a UTF-8 string.
fn strip_text(raw: &[u8]) -> String {
    let clean = strip_ansi_escapes::strip(raw);
    String::from_utf8_lossy(&clean).into_owned()
}
