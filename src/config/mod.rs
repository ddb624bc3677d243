//! Application configuration and constants.
//!
//! This module provides:
//! - Default values for the scheduler, retry and backoff policy
//! - Library option types (`BatchingOptions`, `HealthPolicy`)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{BatchingOptions, HealthPolicy, LogFormat, LogLevel, Opt};
