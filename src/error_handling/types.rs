//! Error type definitions.
//!
//! This module defines all error types used throughout the crate.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Errors surfaced by the scheduler's public API.
///
/// Sink failures never show up here: they are absorbed by the retry wrapper
/// and the connection-health policy.
#[derive(Error, Debug)]
pub enum BatchingError {
    /// A record or configuration value was rejected at call time.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument or field
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The scheduler was constructed outside of a Tokio runtime.
    #[error("No Tokio runtime available; construct the scheduler from within a runtime")]
    RuntimeUnavailable,
}

impl BatchingError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        BatchingError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Failure reported by a sink writer for one batch.
///
/// Every variant is treated as transient by the retry wrapper.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Generic transient failure (dropped connection, timeout, ...).
    #[error("Transient sink failure: {0}")]
    Transient(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// A record's values do not line up with its column names.
    #[error("Record for `{destination}` has {values} values for {columns} columns")]
    SchemaMismatch {
        /// Destination table of the offending record
        destination: String,
        /// Number of column names the record reported
        columns: usize,
        /// Number of values the record produced
        values: usize,
    },
}

/// Error types for database setup operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// A schema or table name that cannot be used as an identifier.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}
