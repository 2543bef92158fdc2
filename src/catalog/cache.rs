//! Read-through record cache.
//!
//! Readers get a cheap `Arc` snapshot; a refresh swaps the whole list at
//! once, so a reader never sees a half-updated catalog.

use std::sync::{Arc, RwLock};

/// Cached list of records, empty until the first successful refresh.
#[derive(Debug)]
pub struct RecordCache<T> {
    records: RwLock<Arc<Vec<T>>>,
}

impl<T> RecordCache<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Current snapshot.
    pub fn read(&self) -> Arc<Vec<T>> {
        match self.records.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the cached list.
    pub fn replace(&self, records: Vec<T>) {
        let records = Arc::new(records);
        match self.records.write() {
            Ok(mut guard) => *guard = records,
            Err(poisoned) => *poisoned.into_inner() = records,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for RecordCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
