//! cadence-terminal: runs job command strings for the scheduler.
//!
//! The scheduler only knows the [`CommandExecutor`] trait. The production
//! implementation, [`ShellExecutor`], hands the command to `sh -c` verbatim,
//! so anyone able to reach the daemon can run arbitrary shell code as the
//! daemon's user. Keep the listener on a trusted interface.
//!
//! ```rust,no_run
//! use cadence_terminal::{CommandExecutor, ShellExecutor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let shell = ShellExecutor::default();
//!     let result = shell.execute("echo hello").await.unwrap();
//!     println!("{}", result.stdout);
//! }
//! ```

pub mod error;
pub mod executor;
pub mod truncate;
pub mod types;

pub use error::{Result, TerminalError};
pub use executor::{CommandExecutor, ShellExecutor};
pub use types::{ExecOptions, ExecResult};
