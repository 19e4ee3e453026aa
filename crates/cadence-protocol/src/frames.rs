use cadence_core::JobId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const KIND_TASK: &str = "task";
pub const KIND_STOP: &str = "stop";
pub const KIND_LIST: &str = "list";

/// Job payload carried by a `task` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: JobId,
    /// Opaque command string, handed to the shell verbatim.
    pub command: String,
    /// Wire: unsigned nanoseconds.
    #[serde(with = "duration_nanos")]
    pub interval: Duration,
    /// Negative = forever, 0 = one more run, N = N more runs after the first.
    pub repeat: i64,
}

/// Controller → daemon request. Exactly one per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Start a new job, optionally tagged with an owner.
    Task {
        task: TaskSpec,
        username: Option<String>,
    },
    /// Cancel a running job.
    Stop { task_id: JobId },
    /// Ask for the ids of running jobs, optionally restricted to one owner.
    List { username: Option<String> },
}

impl Request {
    pub fn task(task: TaskSpec, username: Option<String>) -> Self {
        Request::Task { task, username }
    }

    pub fn stop(task_id: impl Into<JobId>) -> Self {
        Request::Stop {
            task_id: task_id.into(),
        }
    }

    pub fn list(username: Option<String>) -> Self {
        Request::List { username }
    }

    /// The request's `type` discriminator as the controller names it.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Task { .. } => KIND_TASK,
            Request::Stop { .. } => KIND_STOP,
            Request::List { .. } => KIND_LIST,
        }
    }

    /// Owner label for `task`/`list`. An empty username means "no owner".
    pub fn owner(&self) -> Option<&str> {
        let username = match self {
            Request::Task { username, .. } | Request::List { username } => username.as_deref(),
            Request::Stop { .. } => None,
        };
        username.filter(|u| !u.is_empty())
    }
}

/// Daemon → controller response to `list`: ids of the active jobs, in no
/// particular order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobList(pub Vec<JobId>);

impl JobList {
    pub fn ids(&self) -> &[JobId] {
        &self.0
    }

    pub fn into_ids(self) -> Vec<JobId> {
        self.0
    }
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        // Saturate rather than wrap; u64 nanoseconds covers ~584 years.
        let nanos = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}
