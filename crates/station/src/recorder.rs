use crate::{
    config::TableName,
    reading::{PersistenceRecord, TrustedReading},
    storage::{RecordResult, StorageError, StorageSink},
};

/// Turns trusted readings into rows.
pub struct ReadingRecorder<S> {
    sink: S,
    table: TableName,
}

impl<S: StorageSink> ReadingRecorder<S> {
    pub fn new(sink: S, table: TableName) -> Self {
        Self { sink, table }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Makes exactly one persistence attempt for `reading`.
    pub async fn record(&mut self, reading: TrustedReading) -> Result<RecordResult, StorageError> {
        let record = PersistenceRecord::from(&reading);
        let result = self.sink.insert(&self.table, &record).await?;

        if result.rows_written != 1 {
            return Err(StorageError::RowCount(result.rows_written));
        }

        tracing::info!(
            date = %record.date,
            time = %record.time,
            temperature = record.temperature,
            humidity = record.humidity,
            row_id = result.row_id,
            "reading recorded"
        );
        Ok(result)
    }
}
