//! In-memory row store

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Row, RowStore, RowStoreError};

/// Row store holding everything in memory
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    rows: RwLock<Vec<Row>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored row
    pub async fn rows(&self) -> Vec<Row> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn insert_batch(&self, rows: Vec<Row>) -> Result<(), RowStoreError> {
        self.rows.write().await.extend(rows);
        Ok(())
    }

    async fn delete_and_create(&self) -> Result<(), RowStoreError> {
        self.rows.write().await.clear();
        Ok(())
    }

    async fn preview(&self, limit: usize) -> Result<Vec<Row>, RowStoreError> {
        Ok(self.rows.read().await.iter().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64, RowStoreError> {
        Ok(self.rows.read().await.len() as u64)
    }
}
