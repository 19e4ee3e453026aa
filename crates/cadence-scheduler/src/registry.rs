//! The set of active jobs, shared by the dispatcher, the runners and the
//! connection handlers.
//!
//! One `Mutex` guards the whole map. Every operation takes the lock, does
//! its map work and releases it; nothing awaits or blocks while holding it,
//! so there is no ordering to get wrong.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use cadence_core::JobId;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{Result, SchedulerError},
    types::Job,
};

/// A job as seen by everyone except its runner.
///
/// Holders can trigger the job's cancellation but never observe it; the
/// runner owns the only listening side.
#[derive(Debug, Clone)]
pub struct RegisteredJob {
    pub id: JobId,
    pub command: String,
    pub interval: Duration,
    pub owner: Option<String>,
    pub registered_at: DateTime<Utc>,
    serial: u64,
    cancel: CancellationToken,
}

impl RegisteredJob {
    /// Signal the job's runner to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Registration number, distinct for every `insert`.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// What the runner needs from a successful `insert`.
#[derive(Debug)]
pub struct Registration {
    pub serial: u64,
    pub cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, RegisteredJob>,
    next_serial: u64,
}

/// Concurrency-safe map from job id to [`RegisteredJob`].
#[derive(Default)]
pub struct JobRegistry {
    inner: Mutex<Inner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` under its id and hand back its cancellation token.
    ///
    /// Fails with `DuplicateId` if the id is taken; the existing entry is
    /// left untouched.
    pub fn insert(&self, job: &Job) -> Result<Registration> {
        let mut inner = self.lock();
        if inner.jobs.contains_key(&job.id) {
            return Err(SchedulerError::DuplicateId {
                id: job.id.to_string(),
            });
        }

        inner.next_serial += 1;
        let serial = inner.next_serial;
        let cancel = CancellationToken::new();
        inner.jobs.insert(
            job.id.clone(),
            RegisteredJob {
                id: job.id.clone(),
                command: job.command.clone(),
                interval: job.interval,
                owner: job.owner.clone(),
                registered_at: Utc::now(),
                serial,
                cancel: cancel.clone(),
            },
        );
        debug!(job_id = %job.id, serial, "job registered");
        Ok(Registration { serial, cancel })
    }

    /// Remove and return the job with `id`.
    pub fn remove(&self, id: &JobId) -> Result<RegisteredJob> {
        self.lock()
            .jobs
            .remove(id)
            .ok_or_else(|| SchedulerError::NotFound { id: id.to_string() })
    }

    /// Runner-side removal: only removes the entry if it is still the
    /// registration identified by `serial`. Returns whether it removed.
    ///
    /// Guards a finishing runner against deleting a job that was stopped and
    /// re-added under the same id in the meantime.
    pub fn retire(&self, id: &JobId, serial: u64) -> bool {
        let mut inner = self.lock();
        match inner.jobs.get(id) {
            Some(entry) if entry.serial == serial => {
                inner.jobs.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Point-in-time list of active ids, optionally restricted to `owner`.
    ///
    /// `None` or an empty owner returns every id. Order is unspecified.
    pub fn snapshot_ids(&self, owner: Option<&str>) -> Vec<JobId> {
        let owner = owner.filter(|o| !o.is_empty());
        self.lock()
            .jobs
            .values()
            .filter(|job| owner.is_none() || job.owner.as_deref() == owner)
            .map(|job| job.id.clone())
            .collect()
    }

    pub fn get(&self, id: &JobId) -> Option<RegisteredJob> {
        self.lock().jobs.get(id).cloned()
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.lock().jobs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    /// Remove every job at once and return them, e.g. for shutdown.
    pub fn drain(&self) -> Vec<RegisteredJob> {
        self.lock().jobs.drain().map(|(_, job)| job).collect()
    }

    // Each critical section leaves the map consistent, so a panic elsewhere
    // while holding the lock cannot corrupt it.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc};

    fn job(id: &str, owner: Option<&str>) -> Job {
        Job::new(id, "true", Duration::from_millis(10), -1).with_owner(owner.map(String::from))
    }

    #[test]
    fn duplicate_insert_is_rejected_and_keeps_the_original() {
        let reg = JobRegistry::new();
        let first = reg.insert(&job("a", Some("alice"))).unwrap();

        let err = reg.insert(&job("a", Some("bob"))).unwrap_err();
        assert_eq!(err, SchedulerError::DuplicateId { id: "a".into() });

        let kept = reg.get(&JobId::from("a")).unwrap();
        assert_eq!(kept.owner.as_deref(), Some("alice"));
        assert_eq!(kept.serial(), first.serial);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn entry_is_stamped_at_registration() {
        let reg = JobRegistry::new();
        let before = Utc::now();
        reg.insert(&job("a", None)).unwrap();

        let entry = reg.get(&JobId::from("a")).unwrap();
        assert!(entry.registered_at >= before && entry.registered_at <= Utc::now());
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let reg = JobRegistry::new();
        let err = reg.remove(&JobId::from("ghost")).unwrap_err();
        assert_eq!(err, SchedulerError::NotFound { id: "ghost".into() });
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_returns_the_entry_and_cancel_reaches_the_runner_token() {
        let reg = JobRegistry::new();
        let registration = reg.insert(&job("a", None)).unwrap();

        let removed = reg.remove(&JobId::from("a")).unwrap();
        assert!(!registration.cancel.is_cancelled());
        removed.cancel();
        removed.cancel();
        assert!(registration.cancel.is_cancelled());
        assert!(!reg.contains(&JobId::from("a")));
    }

    #[test]
    fn retire_only_removes_its_own_registration() {
        let reg = JobRegistry::new();
        let old = reg.insert(&job("a", None)).unwrap();
        reg.remove(&JobId::from("a")).unwrap();
        let new = reg.insert(&job("a", None)).unwrap();

        assert!(!reg.retire(&JobId::from("a"), old.serial));
        assert!(reg.contains(&JobId::from("a")));
        assert!(reg.retire(&JobId::from("a"), new.serial));
        assert!(!reg.retire(&JobId::from("a"), new.serial));
    }

    #[test]
    fn snapshot_filters_by_owner() {
        let reg = JobRegistry::new();
        reg.insert(&job("1", Some("alice"))).unwrap();
        reg.insert(&job("2", Some("bob"))).unwrap();
        reg.insert(&job("3", Some("alice"))).unwrap();
        reg.insert(&job("4", None)).unwrap();

        let mut alice = reg.snapshot_ids(Some("alice"));
        alice.sort();
        assert_eq!(alice, vec![JobId::from("1"), JobId::from("3")]);

        assert_eq!(reg.snapshot_ids(Some("carol")), Vec::<JobId>::new());
        assert_eq!(reg.snapshot_ids(None).len(), 4);
        assert_eq!(reg.snapshot_ids(Some("")).len(), 4);
    }

    #[test]
    fn drain_empties_the_registry() {
        let reg = JobRegistry::new();
        let a = reg.insert(&job("a", None)).unwrap();
        reg.insert(&job("b", None)).unwrap();

        let drained = reg.drain();
        assert_eq!(drained.len(), 2);
        assert!(reg.is_empty());
        for entry in &drained {
            entry.cancel();
        }
        assert!(a.cancel.is_cancelled());
    }

    #[test]
    fn concurrent_inserts_are_all_visible() {
        let reg = Arc::new(JobRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|t| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        reg.insert(&job(&format!("{t}-{i}"), None)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let ids: HashSet<_> = reg.snapshot_ids(None).into_iter().collect();
        assert_eq!(ids.len(), 16 * 50);
        assert!(ids.contains(&JobId::from("15-49")));
    }
}
