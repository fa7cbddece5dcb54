use std::future::Future;

use sqlx::{
    mysql::{MySqlConnectOptions, MySqlConnection},
    Connection,
};
use thiserror::Error;

use crate::{
    config::{StationCredentials, TableName},
    reading::PersistenceRecord,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("expected one row written, got {0}")]
    RowCount(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordResult {
    pub rows_written: u64,
    /// Identifier the database assigned to the inserted row.
    pub row_id: u64,
}

/// Somewhere persistence records can be written.
pub trait StorageSink {
    /// Inserts a single row into `table` and commits it.
    fn insert(
        &mut self,
        table: &TableName,
        record: &PersistenceRecord,
    ) -> impl Future<Output = Result<RecordResult, StorageError>>;
}

/// Writes records to MySQL, one short-lived connection per record.
pub struct MySqlSink {
    options: MySqlConnectOptions,
}

impl MySqlSink {
    pub fn new(credentials: &StationCredentials) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .username(&credentials.user)
            .password(credentials.password())
            .database(&credentials.database);
        Self { options }
    }
}

impl StorageSink for MySqlSink {
    async fn insert(
        &mut self,
        table: &TableName,
        record: &PersistenceRecord,
    ) -> Result<RecordResult, StorageError> {
        let mut conn = MySqlConnection::connect_with(&self.options).await?;

        // on error the connection is dropped, which closes the socket
        let result = write_record(&mut conn, table, record).await?;

        Ok(after_close(result, conn.close().await))
    }
}

/// The row is committed by the time the connection closes, so a failed
/// close does not fail the write.
fn after_close(result: RecordResult, close: Result<(), sqlx::Error>) -> RecordResult {
    if let Err(e) = close {
        tracing::warn!(
            error = %e,
            row_id = result.row_id,
            "failed to close connection after commit"
        );
    }
    result
}

async fn write_record(
    conn: &mut MySqlConnection,
    table: &TableName,
    record: &PersistenceRecord,
) -> Result<RecordResult, StorageError> {
    let statement = insert_statement(table);

    let mut tx = conn.begin().await?;
    let done = sqlx::query(&statement)
        .bind(record.date.as_str())
        .bind(record.time.as_str())
        .bind(record.label)
        .bind(record.temperature)
        .bind(record.humidity)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(RecordResult {
        rows_written: done.rows_affected(),
        row_id: done.last_insert_id(),
    })
}

fn insert_statement(table: &TableName) -> String {
    format!("INSERT INTO {} VALUES (?, ?, ?, ?, ?)", table.quoted())
}
