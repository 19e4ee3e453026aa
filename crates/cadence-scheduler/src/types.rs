use std::time::Duration;

use cadence_core::JobId;
use serde::{Deserialize, Serialize};

/// A command to run on a fixed interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Caller-chosen id, unique for the registry's lifetime.
    pub id: JobId,
    /// Opaque command string passed to the executor.
    pub command: String,
    /// Time between executions; must be non-zero.
    pub interval: Duration,
    /// Remaining repeat budget:
    /// - `< 0` runs on every tick until stopped
    /// - `0` runs once more, then stops
    /// - `N > 0` runs N more times, then once more on the tick that sees 0
    pub repeat: i64,
    /// Label used to filter listings. `None` means unowned.
    pub owner: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<JobId>, command: impl Into<String>, interval: Duration, repeat: i64) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            interval,
            repeat,
            owner: None,
        }
    }

    /// Tag the job with an owner. Empty strings leave it unowned.
    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner.filter(|o| !o.is_empty());
        self
    }

    /// Total number of executions this job will perform, or `None` if it
    /// runs until stopped.
    pub fn planned_runs(&self) -> Option<u64> {
        u64::try_from(self.repeat).ok().map(|n| n.saturating_add(1))
    }
}

/// Why a [`JobRunner`](crate::runner::JobRunner) left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The repeat budget ran out after the final execution.
    Exhausted,
    /// The job's cancellation token fired (explicit stop or shutdown).
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::Exhausted => "exhausted",
            StopReason::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Final report of a runner, returned from its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id: JobId,
    pub reason: StopReason,
    /// Commands that were started and ran to completion.
    pub executions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_runs_follow_the_repeat_budget() {
        let secs = Duration::from_secs(1);
        assert_eq!(Job::new("a", "true", secs, 0).planned_runs(), Some(1));
        assert_eq!(Job::new("a", "true", secs, 2).planned_runs(), Some(3));
        assert_eq!(Job::new("a", "true", secs, -1).planned_runs(), None);
    }

    #[test]
    fn empty_owner_is_unowned() {
        let job = Job::new("a", "true", Duration::from_secs(1), 0).with_owner(Some(String::new()));
        assert_eq!(job.owner, None);
    }
}
