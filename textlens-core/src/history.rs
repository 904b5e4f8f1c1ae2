//! In-memory history of processed records.
//!
//! The store lives for the lifetime of the process and grows without bound.
//! Appends take the write lock, so a reader only ever sees whole records, and
//! `list_all` hands out an owned snapshot that later appends do not touch.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::ProcessedRecord;

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    records: Arc<RwLock<Vec<ProcessedRecord>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return the new history length.
    pub async fn append(&self, record: ProcessedRecord) -> usize {
        let mut records = self.records.write().await;
        records.push(record);
        records.len()
    }

    /// Snapshot of every record, in append order.
    pub async fn list_all(&self) -> Vec<ProcessedRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
