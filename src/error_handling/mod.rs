//! Error handling.
//!
//! Errors are split by who receives them:
//! - **BatchingError**: returned to producers and callers of the scheduler API
//! - **SinkError**: returned by sink writers, absorbed by retry and health policy
//! - **DatabaseError**: returned by pool and schema setup
//! - **InitializationError**: returned by logger setup

mod types;

// Re-export public API
pub use types::{BatchingError, DatabaseError, InitializationError, SinkError};
