use meeting_engine::{EngineError, ValidationError};
use thiserror::Error;

/// Failures of the local event store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid persisted data: {0}")]
    InvalidData(String),

    #[error("store connection lock poisoned")]
    LockPoisoned,

    #[error("store task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcomes a remote calendar provider can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote provider unreachable: {0}")]
    Unreachable(String),

    #[error("remote provider rejected the credentials")]
    Unauthorized,

    #[error("remote provider rate limited the request")]
    RateLimited,

    #[error("remote provider rejected the request: {0}")]
    Rejected(String),

    #[error("remote event not found: {0}")]
    NotFound(String),
}

impl RemoteError {
    /// Transient failures worth skipping and retrying on a later pass.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::RateLimited)
    }
}

/// Failure to fetch one attendee's availability.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("local store: {0}")]
    Store(#[from] StoreError),

    #[error("remote: {0}")]
    Remote(#[from] RemoteError),
}

/// Failures of a local mutation. Remote failures never appear here.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// The first failing item of a batch processed with
/// [`BatchPolicy::AbortOnFirstError`](crate::service::BatchPolicy).
#[derive(Error, Debug)]
#[error("batch item {index} failed after {completed} completed: {source}")]
pub struct BatchError {
    pub index: usize,
    pub completed: usize,
    #[source]
    pub source: ServiceError,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    #[error("availability fetch cancelled")]
    Cancelled,
}

/// Failures of the end-to-end planning pipeline.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("meeting planning cancelled")]
    Cancelled,
}

impl From<ValidationError> for PlanError {
    fn from(value: ValidationError) -> Self {
        Self::Engine(EngineError::Validation(value))
    }
}

impl From<AggregateError> for PlanError {
    fn from(value: AggregateError) -> Self {
        match value {
            AggregateError::Cancelled => Self::Cancelled,
        }
    }
}
