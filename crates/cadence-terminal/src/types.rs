//! Shared data types for cadence-terminal.

use cadence_core::config::ExecConfig;
use serde::{Deserialize, Serialize};

/// Outcome of one command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Process exit code; `-1` when the child was killed by a signal.
    pub exit_code: i32,

    /// Captured standard output (ANSI escapes stripped, clipped).
    pub stdout: String,

    /// Captured standard error (ANSI escapes stripped, clipped).
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// How [`ShellExecutor`](crate::ShellExecutor) launches commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOptions {
    /// Interpreter invoked as `<shell> -c <command>`.
    pub shell: String,

    /// Maximum characters kept per output stream; see [`crate::truncate`].
    pub max_output_chars: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        ExecConfig::default().into()
    }
}

impl From<ExecConfig> for ExecOptions {
    fn from(config: ExecConfig) -> Self {
        Self {
            shell: config.shell,
            max_output_chars: config.max_output_chars,
        }
    }
}
