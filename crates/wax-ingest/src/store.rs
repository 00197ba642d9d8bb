//! Concurrent keyed record stores
//!
//! One [`RecordStore`] per entity kind, shared between ingestion workers and
//! readers. Every operation is atomic behind a store-wide read/write lock;
//! the store holds process memory only and survives nothing.

use crate::mapper::DumpRecord;
use crate::models::{Artist, Label, Master, Release};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Keyed container with idempotent last-write-wins upserts.
///
/// Writers are serialized against each other and against readers per
/// operation; a reader never observes a partially written record. Lookup
/// misses are a normal outcome, not an error.
#[derive(Debug, Default)]
pub struct RecordStore<T> {
    records: RwLock<HashMap<u64, T>>,
}

impl<T: DumpRecord> RecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or fully replace the record keyed by its ID. Returns the
    /// record it replaced, if any. Never merges fields.
    pub fn upsert(&self, record: T) -> Option<T> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        records.insert(record.id(), record)
    }

    /// Current record for the ID, if present.
    pub fn get(&self, id: u64) -> Option<T> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(&id).cloned()
    }

    /// Snapshot of current contents; iteration order is unspecified.
    pub fn list(&self) -> Vec<T> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.values().cloned().collect()
    }

    /// Number of distinct IDs currently stored.
    pub fn count(&self) -> usize {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Drop every record.
    pub fn clear(&self) {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        records.clear();
    }
}

/// One store per entity kind; the query surface handed to serving code.
#[derive(Debug, Default)]
pub struct Catalog {
    pub artists: RecordStore<Artist>,
    pub labels: RecordStore<Label>,
    pub masters: RecordStore<Master>,
    pub releases: RecordStore<Release>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all kinds.
    pub fn total(&self) -> usize {
        self.artists.count() + self.labels.count() + self.masters.count() + self.releases.count()
    }
}
