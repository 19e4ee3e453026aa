use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// A job with this id is already registered; the registry is unchanged.
    #[error("Duplicate job id: {id}")]
    DuplicateId { id: String },

    /// No job with the given id is registered.
    #[error("Job not found: {id}")]
    NotFound { id: String },

    /// Jobs must tick on a strictly positive interval.
    #[error("Invalid interval for job {id}: must be greater than zero")]
    InvalidInterval { id: String },

    /// The dispatcher task has shut down and accepts no more requests.
    #[error("Dispatcher is not running")]
    DispatcherClosed,
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
