//! Bulk writer flushing record batches into SQLite.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::batching::SinkWriter;
use crate::error_handling::SinkError;

use super::pool::quote_identifier;
use super::record::{SqlRecord, SqlValue};
use super::schema::qualified_name;

/// Upper bound on bound parameters per statement (SQLite's default limit).
const MAX_BIND_PARAMETERS: usize = 32_766;

/// [`SinkWriter`] inserting each batch in a single transaction.
///
/// Consecutive records with the same destination share multi-row `INSERT`
/// statements; the column list comes from the first record of each run. The
/// whole batch commits or none of it does, so a retried batch never leaves
/// partial rows behind.
#[derive(Debug, Clone)]
pub struct SqliteBulkWriter {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteBulkWriter {
    pub fn new(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        SqliteBulkWriter {
            pool,
            namespace: namespace.into(),
        }
    }
}

/// Rows of one destination run, validated against its column list.
fn collect_rows<T: SqlRecord>(
    run: &[T],
    destination: &str,
    columns: usize,
) -> Result<Vec<Vec<SqlValue>>, SinkError> {
    run.iter()
        .map(|record| {
            let values = record.column_values();
            if values.len() != columns {
                return Err(SinkError::SchemaMismatch {
                    destination: destination.to_string(),
                    columns,
                    values: values.len(),
                });
            }
            Ok(values)
        })
        .collect()
}

fn insert_statement(
    namespace: &str,
    destination: &str,
    columns: &[String],
    rows: Vec<Vec<SqlValue>>,
) -> QueryBuilder<'static, Sqlite> {
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        qualified_name(namespace, destination),
        column_list
    ));
    builder.push_values(rows, |mut row, values| {
        for value in values {
            match value {
                SqlValue::Null => row.push_bind(None::<String>),
                SqlValue::Integer(v) => row.push_bind(v),
                SqlValue::Real(v) => row.push_bind(v),
                SqlValue::Text(v) => row.push_bind(v),
            };
        }
    });
    builder
}

#[async_trait]
impl<T: SqlRecord> SinkWriter<T> for SqliteBulkWriter {
    async fn write(&self, batch: &[T]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for run in batch.chunk_by(|a, b| a.destination_name() == b.destination_name()) {
            let destination = run[0].destination_name();
            let columns = run[0].column_names();
            let rows_per_statement = (MAX_BIND_PARAMETERS / columns.len().max(1)).max(1);

            for chunk in run.chunks(rows_per_statement) {
                let rows = collect_rows(chunk, &destination, columns.len())?;
                let mut statement = insert_statement(&self.namespace, &destination, &columns, rows);
                statement.build().execute(&mut *tx).await?;
            }
            log::trace!(
                "Inserted {} rows into {}.{}",
                run.len(),
                self.namespace,
                destination
            );
        }

        tx.commit().await?;
        Ok(())
    }
}
