//! Shared test helpers for storage module tests.

#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::storage::models::RequestLog;
#[cfg(test)]
use crate::storage::{ensure_destination, init_memory_pool};

/// Creates an in-memory pool with `namespace` attached.
#[cfg(test)]
pub async fn create_test_pool(namespace: &str) -> SqlitePool {
    init_memory_pool(namespace)
        .await
        .expect("Failed to create test database pool")
}

/// Creates an in-memory pool with the `request_log` table in `namespace`.
#[cfg(test)]
pub async fn create_request_log_pool(namespace: &str) -> SqlitePool {
    let pool = create_test_pool(namespace).await;
    ensure_destination(&pool, namespace, &sample_log(0))
        .await
        .expect("Failed to create request_log table");
    pool
}

/// A request log with predictable values derived from `n`.
#[cfg(test)]
pub fn sample_log(n: i64) -> RequestLog {
    RequestLog {
        url: format!("https://example.com/{n}"),
        response: "Hello World".to_string(),
        time_taken: n,
    }
}

/// Stored `time_taken` values in insertion order.
#[cfg(test)]
pub async fn stored_ids(pool: &SqlitePool, namespace: &str) -> Vec<i64> {
    let sql = format!(
        "SELECT time_taken FROM {} ORDER BY rowid",
        crate::storage::schema::qualified_name(namespace, "request_log")
    );
    sqlx::query_scalar(&sql)
        .fetch_all(pool)
        .await
        .expect("Failed to read request_log")
}
