//! Application initialization.
//!
//! Logger setup for the demo driver and for applications embedding the
//! scheduler that want the same log format.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
