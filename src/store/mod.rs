//! Row store abstraction
//!
//! Defines the [`RowStore`] trait the import executor writes into, and two
//! implementations:
//! - [`MemoryRowStore`]: rows kept in process memory (tests, embedding)
//! - [`JsonLinesRowStore`]: one JSON object per line in a local file

mod jsonl;
mod memory;

pub use jsonl::JsonLinesRowStore;
pub use memory::MemoryRowStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// One imported row, keyed by confirmed column name
pub type Row = Map<String, Value>;

/// Error type for row store operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RowStoreError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Row store backend error: {0}")]
    BackendError(String),
}

/// Destination for imported rows
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Append a batch of rows
    async fn insert_batch(&self, rows: Vec<Row>) -> Result<(), RowStoreError>;

    /// Drop all rows and start an empty data set
    async fn delete_and_create(&self) -> Result<(), RowStoreError>;

    /// First `limit` rows in insertion order
    async fn preview(&self, limit: usize) -> Result<Vec<Row>, RowStoreError>;

    /// Total number of stored rows
    async fn count(&self) -> Result<u64, RowStoreError>;
}
