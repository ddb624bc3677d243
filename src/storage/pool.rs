//! Database connection pool management.
//!
//! This module initializes and configures the SQLite connection pool with:
//! - WAL mode enabled for concurrent access
//! - Automatic database file creation
//! - The destination namespace attached as a schema on every connection

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};

use crate::config::BUILTIN_SCHEMAS;
use crate::error_handling::DatabaseError;

/// Quotes an SQLite identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// File backing an attached namespace: `<stem>.<namespace>.db` next to the main database.
pub fn attached_path(db_path: &Path, namespace: &str) -> PathBuf {
    let stem = db_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "database".to_string());
    db_path.with_file_name(format!("{}.{}.db", stem, namespace))
}

/// `ATTACH` statement for `namespace`, or `None` for schemas SQLite always has.
fn attach_statement(namespace: &str, target: &str) -> Result<Option<String>, DatabaseError> {
    if namespace.trim().is_empty() {
        return Err(DatabaseError::InvalidIdentifier(namespace.to_string()));
    }
    if BUILTIN_SCHEMAS
        .iter()
        .any(|schema| schema.eq_ignore_ascii_case(namespace))
    {
        return Ok(None);
    }
    Ok(Some(format!(
        "ATTACH DATABASE '{}' AS {}",
        target.replace('\'', "''"),
        quote_identifier(namespace)
    )))
}

/// Initializes a connection pool on the database file at `db_path`.
///
/// Creates the file if it doesn't exist, enables WAL mode and attaches
/// `namespace` (backed by [`attached_path`]) on every connection.
pub async fn init_db_pool_with_path(
    db_path: &Path,
    namespace: &str,
) -> Result<SqlitePool, DatabaseError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            error!("Failed to create database directory: {e}");
            DatabaseError::FileCreationError(e.to_string())
        })?;
    }

    let attach_target = attached_path(db_path, namespace);
    let attach = attach_statement(namespace, &attach_target.to_string_lossy())?;

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = connect(SqlitePoolOptions::new(), options, attach).await?;
    info!("Database ready at {}", db_path.display());
    Ok(pool)
}

/// Initializes a single-connection in-memory pool with `namespace` attached.
///
/// The connection is never recycled, so the data lives as long as the pool.
pub async fn init_memory_pool(namespace: &str) -> Result<SqlitePool, DatabaseError> {
    let attach = attach_statement(namespace, ":memory:")?;
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool_options = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None);

    connect(pool_options, options, attach).await
}

async fn connect(
    pool_options: SqlitePoolOptions,
    options: SqliteConnectOptions,
    attach: Option<String>,
) -> Result<SqlitePool, DatabaseError> {
    let attach: Option<Arc<str>> = attach.map(Arc::from);

    pool_options
        .after_connect(move |conn, _meta| {
            let attach = attach.clone();
            Box::pin(async move {
                if let Some(sql) = attach {
                    conn.execute(&*sql).await?;
                }
                Ok(())
            })
        })
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            DatabaseError::SqlError(e)
        })
}
