//! Error types for the database client

use thiserror::Error;
use tracing::error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// The database could not be reached (pool exhausted, closed, or I/O failure)
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),
}

impl DbError {
    /// Classify a driver error raised while running `context`.
    ///
    /// Connectivity failures become [`DbError::Unavailable`], everything else
    /// a [`DbError::QueryError`].
    pub fn from_sqlx(context: &str, err: sqlx::Error) -> Self {
        error!("{}: {}", context, err);
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::Unavailable(format!("{}: {}", context, err))
            }
            other => DbError::QueryError(format!("{}: {}", context, other)),
        }
    }

    /// Whether the caller may retry the operation later.
    pub fn is_unavailable(&self) -> bool {
        match self {
            DbError::Unavailable(_) => true,
            DbError::SqlxError(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }
}

/// Whether a driver error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sqlx_classifies_pool_timeout_as_unavailable() {
        let err = DbError::from_sqlx("acquire", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Unavailable(_)));
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_from_sqlx_classifies_row_errors_as_query_errors() {
        let err = DbError::from_sqlx("select", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::QueryError(_)));
        assert!(!err.is_unavailable());
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
