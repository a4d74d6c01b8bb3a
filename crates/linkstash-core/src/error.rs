use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors reported by a [`UrlStorage`](crate::UrlStorage) backend.
///
/// A lookup miss and a duplicate long URL are not errors: they are reported
/// through `Option` and [`SaveOutcome::Conflict`](crate::SaveOutcome) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("invalid record: {0}")]
    Validation(String),
    #[error("short id already taken: {0}")]
    IdTaken(String),
    #[error("no urls matched for deletion (user {user_id})")]
    NothingMatched { user_id: String },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}
