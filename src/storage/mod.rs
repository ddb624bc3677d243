// storage/mod.rs
// SQLite sink: pool setup, destination tables and the bulk writer

pub mod models;
pub mod pool;
pub mod record;
pub mod schema;
mod test_helpers;
pub mod writer;

// Re-export commonly used items
pub use models::RequestLog;
pub use pool::{init_db_pool_with_path, init_memory_pool};
pub use record::{SqlRecord, SqlValue};
pub use schema::ensure_destination;
pub use writer::SqliteBulkWriter;
