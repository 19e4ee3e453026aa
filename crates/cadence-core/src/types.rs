use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scheduled job.
///
/// Ids are chosen by the controller when a job is created and the daemon
/// accepts whatever unique string it receives. `JobId::generate` produces
/// the controller's default form: the current UTC time in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Derive a fresh id from a high-resolution timestamp.
    pub fn generate() -> Self {
        let now = Utc::now();
        // timestamp_nanos_opt only fails past the year 2262
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));
        Self(nanos.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
