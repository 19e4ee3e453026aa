//! Error types for the cadence-terminal crate.

use thiserror::Error;

/// Errors that prevent a command from producing an [`ExecResult`](crate::ExecResult).
///
/// A command that runs and exits non-zero is *not* an error here; callers
/// inspect `ExecResult::exit_code`.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The shell could not be started.
    #[error("spawn failed: {0}")]
    Spawn(String),

    /// Reading the child's output or waiting on it failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, TerminalError>;
