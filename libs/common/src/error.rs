//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use std::time::Duration;

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A uniqueness constraint rejected the write
    #[error("Duplicate key violates constraint {0}")]
    Duplicate(String),

    /// The call did not complete within the configured limit
    #[error("Database call timed out after {0:?}")]
    Timeout(Duration),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Classify an error returned by a query.
    ///
    /// Unique violations become [`DatabaseError::Duplicate`], pool and I/O
    /// failures become [`DatabaseError::Connection`], everything else is a
    /// [`DatabaseError::Query`].
    pub fn from_query(err: SqlxError) -> Self {
        match err {
            SqlxError::Database(ref db) if db.is_unique_violation() => {
                DatabaseError::Duplicate(db.constraint().unwrap_or("unique").to_string())
            }
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                DatabaseError::Connection(err)
            }
            other => DatabaseError::Query(other),
        }
    }

    /// True when the error is a uniqueness violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::Duplicate(_))
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
