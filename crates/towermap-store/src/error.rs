//! Error types for towermap-store.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use towermap_types::ValidationError;

/// Result type for towermap-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in towermap-store.
///
/// A duplicate insert is not an error; see
/// [`InsertOutcome::DuplicateIgnored`](crate::InsertOutcome::DuplicateIgnored).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The record was rejected before anything was written.
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    /// The database could not be opened or reached.
    ///
    /// Raised immediately; the store never retries.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A spatial query was stopped by its caller.
    #[error("Query cancelled")]
    Cancelled,

    /// Any other error from SQLite.
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may reasonably retry later.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if matches!(
                    failure.code,
                    ErrorCode::CannotOpen
                        | ErrorCode::NotADatabase
                        | ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::SystemIoFailure
                        | ErrorCode::PermissionDenied
                        | ErrorCode::ReadOnly
                        | ErrorCode::DiskFull
                ) =>
            {
                Error::StorageUnavailable(err.to_string())
            }
            _ => Error::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_is_unavailable() {
        let err: Error = failure(rusqlite::ffi::SQLITE_BUSY).into();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_cannot_open_is_unavailable() {
        let err: Error = failure(rusqlite::ffi::SQLITE_CANTOPEN).into();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_constraint_is_database_error() {
        let err: Error = failure(rusqlite::ffi::SQLITE_CONSTRAINT).into();
        assert!(matches!(err, Error::Database(_)));
    }
}
