//! Record capabilities and the sink writer seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error_handling::SinkError;

/// A value the application hands to the scheduler.
///
/// The scheduler itself never inspects records beyond validating them on
/// enqueue; the column and destination names are for the sink writer.
pub trait Record: Send + Sync + 'static {
    /// Ordered column names this record maps onto.
    fn column_names(&self) -> Vec<String>;

    /// Table or stream the record belongs to.
    fn destination_name(&self) -> String;
}

/// Bulk-write side of the pipeline.
///
/// A write either stores the whole batch or fails. An empty batch must succeed
/// without touching the destination, and the same batch may be written again
/// after a failure.
#[async_trait]
pub trait SinkWriter<T: Record>: Send + Sync + 'static {
    /// Writes `batch` to the destination.
    async fn write(&self, batch: &[T]) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: Record, W: SinkWriter<T> + ?Sized> SinkWriter<T> for Arc<W> {
    async fn write(&self, batch: &[T]) -> Result<(), SinkError> {
        (**self).write(batch).await
    }
}

/// Checks that a record can be mapped by a sink writer.
pub(crate) fn validate_record<T: Record>(record: &T) -> Result<(), crate::BatchingError> {
    if record.destination_name().trim().is_empty() {
        return Err(crate::BatchingError::invalid(
            "record",
            "destination name must not be empty",
        ));
    }
    if record.column_names().is_empty() {
        return Err(crate::BatchingError::invalid(
            "record",
            "record must map at least one column",
        ));
    }
    Ok(())
}
