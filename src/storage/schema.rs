// storage/schema.rs
// Destination table management

use sqlx::SqlitePool;

use crate::batching::Record;
use crate::error_handling::DatabaseError;

use super::pool::quote_identifier;

/// Fully qualified, quoted `"<namespace>"."<table>"` name.
pub fn qualified_name(namespace: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(namespace), quote_identifier(table))
}

/// Creates the destination table for `sample` if it doesn't exist.
///
/// Columns are untyped (SQLite affinity BLOB) so any record values fit.
pub async fn ensure_destination<T: Record>(
    pool: &SqlitePool,
    namespace: &str,
    sample: &T,
) -> Result<(), DatabaseError> {
    let table = sample.destination_name();
    let columns = sample
        .column_names()
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_name(namespace, &table),
        columns
    );
    sqlx::query(&sql).execute(pool).await?;
    log::debug!("Destination {}.{} ready", namespace, table);
    Ok(())
}
