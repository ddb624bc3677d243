// storage/models.rs
// Demo record type

use crate::batching::Record;

use super::record::{SqlRecord, SqlValue};

/// One observed HTTP request, as logged by the demo driver.
///
/// # Database Schema
///
/// Maps onto the `request_log` table with columns `response`, `time_taken`
/// and `url`. `time_taken` is stored in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    pub url: String,
    pub response: String,
    pub time_taken: i64,
}

impl Record for RequestLog {
    fn column_names(&self) -> Vec<String> {
        vec![
            "response".to_string(),
            "time_taken".to_string(),
            "url".to_string(),
        ]
    }

    fn destination_name(&self) -> String {
        "request_log".to_string()
    }
}

impl SqlRecord for RequestLog {
    fn column_values(&self) -> Vec<SqlValue> {
        vec![
            self.response.as_str().into(),
            self.time_taken.into(),
            self.url.as_str().into(),
        ]
    }
}
