//! One scheduling loop per active job.

use std::sync::Arc;

use cadence_core::JobId;
use cadence_terminal::{CommandExecutor, ExecResult, TerminalError};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    registry::{JobRegistry, Registration},
    types::{Job, RunSummary, StopReason},
};

/// Drives a single job: waits for each tick, runs the command, spends the
/// repeat budget, and removes the job from the registry when the budget is
/// gone.
///
/// The runner is the only writer of `job.repeat` and the only listener on
/// the job's cancellation token. Every wait (for the next tick or for a
/// running command) is raced against that token, so a stop takes effect
/// immediately rather than at the next tick.
pub struct JobRunner {
    job: Job,
    serial: u64,
    cancel: CancellationToken,
    registry: Arc<JobRegistry>,
    executor: Arc<dyn CommandExecutor>,
}

impl JobRunner {
    pub fn new(
        job: Job,
        registration: Registration,
        registry: Arc<JobRegistry>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            job,
            serial: registration.serial,
            cancel: registration.cancel,
            registry,
            executor,
        }
    }

    /// Run until the repeat budget is exhausted or the job is cancelled.
    pub async fn run(mut self) -> RunSummary {
        let period = self.job.interval;
        info!(
            job_id = %self.job.id,
            command = %self.job.command,
            interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            planned_runs = ?self.job.planned_runs(),
            "job started"
        );
        let mut guard = RetireOnDrop {
            registry: Arc::clone(&self.registry),
            id: self.job.id.clone(),
            serial: self.serial,
            armed: true,
        };

        // First execution happens one full interval after start.
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut executions = 0u64;
        let reason = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                _ = ticker.tick() => {
                    let last = self.job.repeat == 0;
                    if self.job.repeat > 0 {
                        self.job.repeat -= 1;
                    }
                    if !self.execute_once().await {
                        break StopReason::Cancelled;
                    }
                    executions += 1;
                    if last {
                        break StopReason::Exhausted;
                    }
                }
            }
        };
        guard.armed = false;

        match reason {
            StopReason::Exhausted => {
                self.cancel.cancel();
                if self.registry.retire(&self.job.id, self.serial) {
                    info!(job_id = %self.job.id, executions, "job finished, repeat budget exhausted");
                } else {
                    // A stop raced the final tick and already removed the entry.
                    debug!(job_id = %self.job.id, "job already removed before exhaustion");
                }
            }
            StopReason::Cancelled => {
                info!(job_id = %self.job.id, executions, "job stopped");
            }
        }

        RunSummary {
            id: self.job.id,
            reason,
            executions,
        }
    }

    /// Run the command once. Returns `false` if cancellation arrived first;
    /// the in-flight command future is dropped in that case.
    async fn execute_once(&self) -> bool {
        debug!(job_id = %self.job.id, remaining = self.job.repeat, "tick");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.executor.execute(&self.job.command) => {
                log_result(&self.job, result);
                true
            }
        }
    }
}

/// Removes the runner's registry entry if `run` is torn down before its
/// loop ends: the executor panicked or the task was aborted. Disarmed on
/// every normal exit.
struct RetireOnDrop {
    registry: Arc<JobRegistry>,
    id: JobId,
    serial: u64,
    armed: bool,
}

impl Drop for RetireOnDrop {
    fn drop(&mut self) {
        if self.armed && self.registry.retire(&self.id, self.serial) {
            error!(job_id = %self.id, "job runner died, job removed");
        }
    }
}

/// Execution failures are logged and never stop the job.
fn log_result(job: &Job, result: Result<ExecResult, TerminalError>) {
    match result {
        Ok(out) if out.success() => {
            info!(job_id = %job.id, output = %out.stdout.trim_end(), "command succeeded");
        }
        Ok(out) => {
            warn!(
                job_id = %job.id,
                exit_code = out.exit_code,
                stderr = %out.stderr.trim_end(),
                "command failed"
            );
        }
        Err(e) => {
            warn!(job_id = %job.id, error = %e, "command could not be executed");
        }
    }
}
