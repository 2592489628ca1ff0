//! Error types for storage operations.
//!
//! Validation failures live in [`crate::validation`]; everything here is an
//! infrastructure failure that surfaces to clients as a server error with the
//! underlying failure text.

use thiserror::Error;

/// Result type alias using `StorageError`.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failure to persist or reach the application store.
///
/// `Display` renders only the underlying failure description, since the
/// HTTP layer returns it verbatim in the error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("{0}")]
    Database(String),

    /// The write was rejected by a constraint.
    #[error("{0}")]
    ConstraintViolation(String),

    /// The store could not be reached at all.
    #[error("{0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_check_violation() =>
            {
                Self::ConstraintViolation(db_err.to_string())
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_raw_failure_text() {
        let err = StorageError::Database("connection reset by peer".to_string());
        assert_eq!(err.to_string(), "connection reset by peer");
    }

    #[test]
    fn pool_exhaustion_maps_to_unavailable() {
        let err = StorageError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[test]
    fn row_not_found_maps_to_database() {
        let err = StorageError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StorageError::Database(_)));
    }
}
