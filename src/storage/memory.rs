//! In-memory storage, for tests and throwaway runs.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::models::ComicRecord;
use crate::storage::RecordStore;

/// Records keyed by `(kind, source)`.
#[derive(Default)]
pub struct MemoryStorage {
    records: DashMap<(String, String), ComicRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ComicRecord>) -> Self {
        let storage = Self::new();
        for record in records {
            storage
                .records
                .insert((record.kind.clone(), record.source.clone()), record);
        }
        storage
    }

    pub fn get(&self, kind: &str, source: &str) -> Option<ComicRecord> {
        self.records
            .get(&(kind.to_string(), source.to_string()))
            .map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStorage {
    async fn load_records(&self, kind: &str, limit: usize) -> Result<Vec<ComicRecord>> {
        let mut records: Vec<ComicRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.source.cmp(&b.source));
        records.truncate(limit);
        Ok(records)
    }

    async fn put_record(&self, record: &ComicRecord) -> Result<()> {
        self.records
            .insert((record.kind.clone(), record.source.clone()), record.clone());
        Ok(())
    }
}
