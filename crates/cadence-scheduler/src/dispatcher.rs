//! The single decision point for job lifecycle changes.
//!
//! Connection handlers never touch runners directly. They send `Start` and
//! `Stop` commands through a [`DispatcherHandle`]; one [`Dispatcher`] task
//! applies them strictly in arrival order. Registering a job and spawning
//! its runner (or removing it and cancelling the runner) happen inside one
//! command, so no interleaving can leave an id without a runner or a runner
//! without an id.

use std::sync::Arc;

use cadence_core::JobId;
use cadence_terminal::CommandExecutor;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinSet,
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{Result, SchedulerError},
    registry::JobRegistry,
    runner::JobRunner,
    types::{Job, RunSummary},
};

enum Command {
    Start {
        job: Job,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        id: JobId,
        reply: oneshot::Sender<Result<()>>,
    },
    Shutdown {
        reply: oneshot::Sender<usize>,
    },
}

/// Cloneable front door to the dispatcher task.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<Command>,
}

impl DispatcherHandle {
    /// Register `job` and start its runner.
    ///
    /// # Errors
    ///
    /// - `DuplicateId`     : the id is already active; nothing changed.
    /// - `InvalidInterval` : the interval is zero.
    /// - `DispatcherClosed`: the dispatcher has shut down.
    pub async fn start(&self, job: Job) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Start { job, reply }).await?;
        rx.await.map_err(|_| SchedulerError::DispatcherClosed)?
    }

    /// Cancel the job with `id` and remove it from the registry.
    ///
    /// # Errors
    ///
    /// - `NotFound`        : no such job; nothing changed.
    /// - `DispatcherClosed`: the dispatcher has shut down.
    pub async fn stop(&self, id: JobId) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Stop { id, reply }).await?;
        rx.await.map_err(|_| SchedulerError::DispatcherClosed)?
    }

    /// Cancel every job, wait for the runners to exit, and end the
    /// dispatcher. Returns how many jobs were cancelled.
    pub async fn shutdown(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Shutdown { reply }).await?;
        rx.await.map_err(|_| SchedulerError::DispatcherClosed)
    }

    async fn request(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| SchedulerError::DispatcherClosed)
    }
}

/// Actor that owns runner spawning and cancellation.
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    executor: Arc<dyn CommandExecutor>,
    rx: mpsc::Receiver<Command>,
    runners: JoinSet<RunSummary>,
}

impl Dispatcher {
    /// Create the actor and its handle. Nothing runs until [`Dispatcher::run`]
    /// is spawned.
    pub fn new(
        registry: Arc<JobRegistry>,
        executor: Arc<dyn CommandExecutor>,
        queue_capacity: usize,
    ) -> (Self, DispatcherHandle) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let dispatcher = Self {
            registry,
            executor,
            rx,
            runners: JoinSet::new(),
        };
        (dispatcher, DispatcherHandle { tx })
    }

    /// Convenience: create the actor and spawn it on the current runtime.
    pub fn spawn(
        registry: Arc<JobRegistry>,
        executor: Arc<dyn CommandExecutor>,
        queue_capacity: usize,
    ) -> (DispatcherHandle, tokio::task::JoinHandle<()>) {
        let (dispatcher, handle) = Self::new(registry, executor, queue_capacity);
        (handle, tokio::spawn(dispatcher.run()))
    }

    /// Main loop. Ends on `Shutdown` or once every handle is dropped; either
    /// way all remaining jobs are cancelled first.
    pub async fn run(mut self) {
        info!("dispatcher started");
        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(Command::Start { job, reply }) => {
                        let _ = reply.send(self.start(job));
                    }
                    Some(Command::Stop { id, reply }) => {
                        let _ = reply.send(self.stop(&id));
                    }
                    Some(Command::Shutdown { reply }) => {
                        let cancelled = self.cancel_all().await;
                        let _ = reply.send(cancelled);
                        break;
                    }
                    None => {
                        self.cancel_all().await;
                        break;
                    }
                },
                Some(joined) = self.runners.join_next(), if !self.runners.is_empty() => {
                    match joined {
                        Ok(summary) => debug!(
                            job_id = %summary.id,
                            reason = %summary.reason,
                            executions = summary.executions,
                            "runner exited"
                        ),
                        // The runner retires its own entry while unwinding.
                        Err(e) => error!("job runner task failed: {e}"),
                    }
                }
            }
        }
        info!("dispatcher stopped");
    }

    fn start(&mut self, job: Job) -> Result<()> {
        if job.interval.is_zero() {
            warn!(job_id = %job.id, "rejecting job with zero interval");
            return Err(SchedulerError::InvalidInterval {
                id: job.id.to_string(),
            });
        }

        let registration = match self.registry.insert(&job) {
            Ok(r) => r,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "job not started");
                return Err(e);
            }
        };

        info!(job_id = %job.id, owner = ?job.owner, "job accepted");
        let runner = JobRunner::new(
            job,
            registration,
            Arc::clone(&self.registry),
            Arc::clone(&self.executor),
        );
        self.runners.spawn(runner.run());
        Ok(())
    }

    fn stop(&mut self, id: &JobId) -> Result<()> {
        match self.registry.remove(id) {
            Ok(entry) => {
                entry.cancel();
                info!(
                    job_id = %id,
                    registered_at = %entry.registered_at.to_rfc3339(),
                    "stopping job"
                );
                Ok(())
            }
            Err(e) => {
                warn!(job_id = %id, "stop requested for unknown job");
                Err(e)
            }
        }
    }

    async fn cancel_all(&mut self) -> usize {
        let drained = self.registry.drain();
        for entry in &drained {
            entry.cancel();
        }
        while self.runners.join_next().await.is_some() {}
        info!(cancelled = drained.len(), "all jobs cancelled");
        drained.len()
    }
}
