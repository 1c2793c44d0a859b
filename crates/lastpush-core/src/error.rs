//! Error types and result handling for push event operations.
//!
//! Database failures are classified on conversion so callers can tell a
//! constraint violation from an unavailable store. Timeouts carry the
//! operation name and budget for logging.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for domain and storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A store operation exceeded its time budget.
    #[error("Timed out: {operation} exceeded {after_ms}ms")]
    Timeout {
        /// Name of the operation that was aborted
        operation: &'static str,
        /// Budget that was exceeded in milliseconds
        after_ms: u64,
    },
}

impl CoreError {
    /// Returns whether the caller may retry the same request later.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Timeout { .. })
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested entity not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = CoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn pool_timeout_maps_to_database() {
        let err = CoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, CoreError::Database(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn timeout_message_names_operation() {
        let err = CoreError::Timeout { operation: "insert_push_event", after_ms: 2000 };
        assert_eq!(err.to_string(), "Timed out: insert_push_event exceeded 2000ms");
        assert!(err.is_retryable());
    }

    #[test]
    fn invalid_input_is_not_retryable() {
        assert!(!CoreError::InvalidInput("empty pusher name".to_string()).is_retryable());
        assert!(!CoreError::ConstraintViolation("check".to_string()).is_retryable());
    }
}
