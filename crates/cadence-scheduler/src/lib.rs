//! `cadence-scheduler`: in-memory interval job scheduling on Tokio.
//!
//! # Overview
//!
//! | Piece | Role |
//! |-------|------|
//! | [`JobRegistry`] | lock-protected map of active jobs, shared by everyone |
//! | [`Dispatcher`] | one task that applies `Start` / `Stop` in arrival order |
//! | [`JobRunner`] | one task per job: timer, repeat budget, cancellation |
//!
//! A job leaves the registry exactly once: either its runner exhausts the
//! repeat budget and retires it, or the dispatcher removes it on `Stop` and
//! cancels the runner. Nothing is persisted; a restart forgets every job.

pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod runner;
pub mod types;

#[cfg(test)]
mod testing;

pub use dispatcher::{Dispatcher, DispatcherHandle};
pub use error::{Result, SchedulerError};
pub use registry::{JobRegistry, RegisteredJob, Registration};
pub use runner::JobRunner;
pub use types::{Job, RunSummary, StopReason};
