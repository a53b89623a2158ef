//! JSON Lines row store
//!
//! Stores each row as one JSON object per line. Used by the CLI so imported data
//! can be inspected with ordinary text tools.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use super::{Row, RowStore, RowStoreError};

/// Row store backed by a `.jsonl` file
pub struct JsonLinesRowStore {
    path: PathBuf,
    /// Serializes appends and truncation; appends hold it from a blocking task
    write_lock: Arc<Mutex<()>>,
}

impl JsonLinesRowStore {
    /// Create a store writing to `path`
    ///
    /// The file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent(&self) -> Result<(), RowStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                RowStoreError::IoError(format!(
                    "Failed to create directory for {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    async fn open_lines(
        &self,
    ) -> Result<Option<tokio::io::Lines<BufReader<fs::File>>>, RowStoreError> {
        match fs::File::open(&self.path).await {
            Ok(file) => Ok(Some(BufReader::new(file).lines())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RowStoreError::IoError(format!(
                "Failed to open {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

fn read_error(e: std::io::Error) -> RowStoreError {
    RowStoreError::IoError(format!("Failed to read row: {e}"))
}

/// Append whole lines, truncating back to the previous length if the write fails
fn append_lines(path: &Path, buffer: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let len = file.metadata()?.len();
    let written = file.write_all(buffer).and_then(|()| file.flush());
    if written.is_err() {
        let _ = file.set_len(len);
    }
    written
}

#[async_trait]
impl RowStore for JsonLinesRowStore {
    async fn insert_batch(&self, rows: Vec<Row>) -> Result<(), RowStoreError> {
        let mut buffer = Vec::new();
        for row in &rows {
            serde_json::to_writer(&mut buffer, row)
                .map_err(|e| RowStoreError::SerializationError(e.to_string()))?;
            buffer.push(b'\n');
        }

        let guard = Arc::clone(&self.write_lock).lock_owned().await;
        self.ensure_parent().await?;

        // Runs to completion even if this future is dropped, so a cancelled insert
        // never leaves half a line behind; the lock is held until the write ends
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            append_lines(&path, &buffer).map_err(|e| {
                RowStoreError::IoError(format!("Failed to write {}: {}", path.display(), e))
            })
        })
        .await
        .map_err(|e| RowStoreError::BackendError(format!("Write task failed: {e}")))?
    }

    async fn delete_and_create(&self) -> Result<(), RowStoreError> {
        let _guard = self.write_lock.lock().await;
        self.ensure_parent().await?;
        fs::write(&self.path, b"").await.map_err(|e| {
            RowStoreError::IoError(format!("Failed to reset {}: {}", self.path.display(), e))
        })
    }

    async fn preview(&self, limit: usize) -> Result<Vec<Row>, RowStoreError> {
        let Some(mut lines) = self.open_lines().await? else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        while rows.len() < limit {
            let Some(line) = lines.next_line().await.map_err(read_error)? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            let row: Row = serde_json::from_str(&line)
                .map_err(|e| RowStoreError::SerializationError(e.to_string()))?;
            rows.push(row);
        }
        Ok(rows)
    }

    async fn count(&self) -> Result<u64, RowStoreError> {
        let Some(mut lines) = self.open_lines().await? else {
            return Ok(0);
        };

        let mut count = 0;
        while let Some(line) = lines.next_line().await.map_err(read_error)? {
            if !line.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}
