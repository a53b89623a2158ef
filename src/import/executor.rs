//! Import executor
//!
//! Streams a source into the row store under a confirmed schema. A blocking
//! reader thread parses and coerces rows and hands batches to an async writer
//! task over a bounded channel, so memory stays flat regardless of source size.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::config::ImportConfig;
use super::error::ImportError;
use super::job::{ErrorInfo, ImportJob};
use crate::cache::CacheInvalidation;
use crate::inference::InferenceConfig;
use crate::inference::classify::{Coerced, coerce};
use crate::schema::ConfirmedSchema;
use crate::source::{SourceReference, prepare_reader};
use crate::store::{Row, RowStore};

/// A run of parsed rows plus the counters gathered while reading them
#[derive(Debug)]
struct RowBatch {
    rows: Vec<Row>,
    /// 1-based data row number of the first row read into this batch
    first_row: u64,
    skipped: u64,
    coerced: u64,
}

#[derive(Debug)]
enum ReadEvent {
    Batch(RowBatch),
    Failed(ErrorInfo),
}

/// How sources are read; shared with inference so both see the same columns
#[derive(Debug, Clone)]
struct ReadOptions {
    has_headers: bool,
    delimiter: Option<u8>,
    fetch_timeout: Duration,
}

/// Runs imports and tracks the single import job
pub struct ImportExecutor {
    job: Arc<Mutex<ImportJob>>,
    store: Arc<dyn RowStore>,
    caches: Vec<Arc<dyn CacheInvalidation>>,
    read_caches: Vec<Arc<dyn CacheInvalidation>>,
    config: ImportConfig,
    read: ReadOptions,
}

impl ImportExecutor {
    /// Create an executor writing to `store`
    ///
    /// `inference` supplies the header and delimiter settings so the import reads
    /// the source exactly as inference did.
    pub fn new(
        store: Arc<dyn RowStore>,
        config: ImportConfig,
        inference: &InferenceConfig,
    ) -> Result<Self, ImportError> {
        config.validate().map_err(ImportError::InvalidConfig)?;
        inference.validate().map_err(ImportError::InvalidConfig)?;
        Ok(Self {
            job: Arc::new(Mutex::new(ImportJob::default())),
            store,
            caches: Vec::new(),
            read_caches: Vec::new(),
            config,
            read: ReadOptions {
                has_headers: inference.has_headers,
                delimiter: inference.delimiter_byte(),
                fetch_timeout: inference.fetch_timeout(),
            },
        })
    }

    /// Register a cache to clear when an import completes
    pub fn with_cache(mut self, cache: Arc<dyn CacheInvalidation>) -> Self {
        self.caches.push(cache);
        self
    }

    /// Register a cache of row store reads
    ///
    /// Cleared every time an import changes the row store: after the reset, and
    /// when the import fails or completes.
    pub fn with_read_cache(mut self, cache: Arc<dyn CacheInvalidation>) -> Self {
        self.read_caches.push(cache);
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    fn lock_job(&self) -> MutexGuard<'_, ImportJob> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current job; never waits on the import itself
    pub fn status(&self) -> ImportJob {
        self.lock_job().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock_job().is_running()
    }

    /// Start importing `source` under `schema`
    ///
    /// Returns as soon as the job is `Running`; rows are written in the
    /// background. Fails with [`ImportError::AlreadyInProgress`] and leaves the
    /// running job untouched if another import has not finished.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        &self,
        upload_id: &str,
        source: SourceReference,
        schema: ConfirmedSchema,
    ) -> Result<ImportJob, ImportError> {
        let snapshot = {
            let mut job = self.lock_job();
            if job.is_running() {
                return Err(ImportError::AlreadyInProgress {
                    job_id: job.job_id.clone().unwrap_or_default(),
                });
            }
            job.begin(upload_id);
            job.clone()
        };
        let job_id = snapshot.job_id.clone().unwrap_or_default();

        info!(
            job_id = %job_id,
            upload_id = %upload_id,
            location = %source.location,
            columns = schema.len(),
            batch_size = self.config.batch_size,
            "Starting import"
        );

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let read = self.read.clone();
        let batch_size = self.config.batch_size;
        let reader = tokio::task::spawn_blocking(move || {
            read_source(&source, &schema, &read, batch_size, tx)
        });

        let writer = Writer {
            job: Arc::clone(&self.job),
            store: Arc::clone(&self.store),
            caches: self.caches.clone(),
            read_caches: self.read_caches.clone(),
            write_timeout: self.config.write_timeout(),
            replace_existing: self.config.replace_existing,
            job_id,
        };
        let span = info_span!("import", job_id = %writer.job_id);
        tokio::spawn(writer.run(rx, reader).instrument(span));

        Ok(snapshot)
    }

    /// Poll until the current job leaves `Running`
    pub async fn wait(&self, poll_interval: Duration) -> ImportJob {
        loop {
            let job = self.status();
            if !job.is_running() {
                return job;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Async half of an import: writes batches and settles the job state
struct Writer {
    job: Arc<Mutex<ImportJob>>,
    store: Arc<dyn RowStore>,
    caches: Vec<Arc<dyn CacheInvalidation>>,
    read_caches: Vec<Arc<dyn CacheInvalidation>>,
    write_timeout: Duration,
    replace_existing: bool,
    job_id: String,
}

impl Writer {
    fn lock_job(&self) -> MutexGuard<'_, ImportJob> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear_read_caches(&self) {
        for cache in &self.read_caches {
            cache.clear_all();
        }
    }

    async fn run(self, mut rx: mpsc::Receiver<ReadEvent>, reader: JoinHandle<()>) {
        let mut failure = None;

        if self.replace_existing {
            match tokio::time::timeout(self.write_timeout, self.store.delete_and_create()).await {
                Ok(Ok(())) => self.clear_read_caches(),
                Ok(Err(e)) => {
                    failure = Some(ErrorInfo::unpositioned(format!(
                        "Failed to reset row store: {e}"
                    )))
                }
                Err(_) => {
                    failure = Some(ErrorInfo::unpositioned(format!(
                        "Resetting row store timed out after {:?}",
                        self.write_timeout
                    )))
                }
            }
        }

        while failure.is_none() {
            let Some(event) = rx.recv().await else {
                break;
            };
            match event {
                ReadEvent::Batch(batch) => {
                    if let Err(info) = self.write(batch).await {
                        failure = Some(info);
                    }
                }
                ReadEvent::Failed(info) => failure = Some(info),
            }
        }

        // Stops the reader if it is still sending
        drop(rx);

        if failure.is_none()
            && let Err(e) = reader.await
        {
            failure = Some(ErrorInfo::unpositioned(format!(
                "Source reader stopped unexpectedly: {e}"
            )));
        }

        // Batches written before a failure changed the store too
        self.clear_read_caches();

        match failure {
            Some(info) => {
                let mut job = self.lock_job();
                error!(
                    job_id = %self.job_id,
                    row = ?info.row,
                    cause = %info.cause,
                    rows_processed = job.rows_processed,
                    "Import failed"
                );
                job.fail(info);
            }
            None => {
                for cache in &self.caches {
                    cache.clear_all();
                }
                let mut job = self.lock_job();
                job.complete();
                info!(
                    job_id = %self.job_id,
                    rows_processed = job.rows_processed,
                    rows_skipped = job.rows_skipped,
                    cells_coerced = job.cells_coerced,
                    duration_ms = ?job.duration_ms(),
                    "Import completed"
                );
            }
        }
    }

    async fn write(&self, batch: RowBatch) -> Result<(), ErrorInfo> {
        let written = batch.rows.len() as u64;
        if written > 0 {
            match tokio::time::timeout(self.write_timeout, self.store.insert_batch(batch.rows))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(ErrorInfo::at_row(
                        batch.first_row,
                        format!("Row store write failed: {e}"),
                    ));
                }
                Err(_) => {
                    return Err(ErrorInfo::at_row(
                        batch.first_row,
                        format!("Row store write timed out after {:?}", self.write_timeout),
                    ));
                }
            }
        }

        let mut job = self.lock_job();
        job.record_batch(written, batch.skipped, batch.coerced);
        debug!(
            job_id = %self.job_id,
            written,
            skipped = batch.skipped,
            rows_processed = job.rows_processed,
            "Wrote batch"
        );
        Ok(())
    }
}

/// Blocking half of an import: parse, coerce and batch rows
///
/// Stops quietly if the writer has gone away.
fn read_source(
    source: &SourceReference,
    schema: &ConfirmedSchema,
    read: &ReadOptions,
    batch_size: usize,
    tx: mpsc::Sender<ReadEvent>,
) {
    let fail = |info: ErrorInfo| {
        let _ = tx.blocking_send(ReadEvent::Failed(info));
    };

    let reader = match source.open(read.fetch_timeout) {
        Ok(reader) => reader,
        Err(e) => return fail(ErrorInfo::unpositioned(e.to_string())),
    };
    let (buffered, delimiter) = match prepare_reader(reader, read.delimiter) {
        Ok(prepared) => prepared,
        Err(e) => return fail(ErrorInfo::unpositioned(format!("Failed reading source: {e}"))),
    };

    // Rows whose width differs from the header are malformed
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(read.has_headers)
        .flexible(false)
        .delimiter(delimiter)
        .from_reader(buffered);

    let mut record = csv::StringRecord::new();
    let mut row_number = 0u64;
    let mut batch = new_batch(batch_size, 1);

    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {
                row_number += 1;
                let (row, coerced) = map_record(&record, schema);
                batch.rows.push(row);
                batch.coerced += coerced;
            }
            Ok(false) => break,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return fail(ErrorInfo::at_row(
                    row_number + 1,
                    format!("Failed reading source: {e}"),
                ));
            }
            Err(e) => {
                row_number += 1;
                batch.skipped += 1;
                warn!(row = row_number, error = %e, "Skipping malformed row");
            }
        }

        if batch.rows.len() >= batch_size {
            let full = std::mem::replace(&mut batch, new_batch(batch_size, row_number + 1));
            if tx.blocking_send(ReadEvent::Batch(full)).is_err() {
                return;
            }
        }
    }

    if !batch.rows.is_empty() || batch.skipped > 0 {
        let _ = tx.blocking_send(ReadEvent::Batch(batch));
    }
}

fn new_batch(capacity: usize, first_row: u64) -> RowBatch {
    RowBatch {
        rows: Vec::with_capacity(capacity),
        first_row,
        skipped: 0,
        coerced: 0,
    }
}

/// Map a record onto the schema by position
///
/// Extra cells are dropped and missing cells become null. Returns the row and the
/// number of cells that failed to parse.
fn map_record(record: &csv::StringRecord, schema: &ConfirmedSchema) -> (Row, u64) {
    let mut row = Row::new();
    let mut coerced = 0;
    for (i, column) in schema.columns.iter().enumerate() {
        let value = match record.get(i).map(|raw| coerce(raw, column.column_type)) {
            Some(Coerced::Failed) => {
                coerced += 1;
                serde_json::Value::Null
            }
            Some(cell) => cell.into_value(),
            None => serde_json::Value::Null,
        };
        row.insert(column.name.clone(), value);
    }
    (row, coerced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ColumnType;
    use crate::schema::ConfirmedColumn;
    use serde_json::json;

    fn schema() -> ConfirmedSchema {
        ConfirmedSchema::new(vec![
            ConfirmedColumn::new("name", ColumnType::String),
            ConfirmedColumn::new("amount", ColumnType::Number),
        ])
        .unwrap()
    }

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_map_record_coerces_by_position() {
        let (row, coerced) = map_record(&record(&["A", "10"]), &schema());
        assert_eq!(row["name"], json!("A"));
        assert_eq!(row["amount"], json!(10));
        assert_eq!(coerced, 0);
    }

    #[test]
    fn test_map_record_failed_cell_is_null() {
        let (row, coerced) = map_record(&record(&["A", "ten"]), &schema());
        assert_eq!(row["amount"], serde_json::Value::Null);
        assert_eq!(coerced, 1);
    }

    #[test]
    fn test_map_record_short_and_long_rows() {
        let (row, coerced) = map_record(&record(&["A"]), &schema());
        assert_eq!(row["amount"], serde_json::Value::Null);
        assert_eq!(coerced, 0);

        let (row, _) = map_record(&record(&["A", "1", "extra"]), &schema());
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_empty_cell_is_null_not_coerced() {
        let (row, coerced) = map_record(&record(&["", ""]), &schema());
        assert_eq!(row["name"], serde_json::Value::Null);
        assert_eq!(coerced, 0);
    }
}
