//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

/// In-memory table for committed writes
pub struct MemTable {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Approximate size: sum of key and value lengths
    size: usize,
}

impl Inner {
    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let added = key.len() + value.len();
        if let Some(old) = self.data.insert(key.clone(), value) {
            // Overwrite: key bytes were already counted
            self.size = self.size - (key.len() + old.len()) + added;
        } else {
            self.size += added;
        }
    }
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().data.get(key).cloned()
    }

    /// Put a key-value pair (write lock)
    ///
    /// Returns the new approximate size.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut inner = self.inner.write();
        inner.insert(key, value);
        inner.size
    }

    /// Apply every write of a block under one write lock
    ///
    /// Later writes to the same key win. Returns the new approximate size.
    pub fn apply_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> usize {
        let mut inner = self.inner.write();
        for (key, value) in writes {
            inner.insert(key, value);
        }
        inner.size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot of all entries in sorted key order (for flush)
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, Vec<u8>)> {
        let snapshot: Vec<_> = self
            .inner
            .read()
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        snapshot.into_iter()
    }

    /// Move every entry out, leaving the table empty
    pub fn take(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        let mut inner = self.inner.write();
        inner.size = 0;
        std::mem::take(&mut inner.data)
    }

    /// Put back entries taken by a flush that failed
    ///
    /// Keys written since the `take` are newer and keep their value.
    pub fn restore(&self, entries: BTreeMap<Vec<u8>, Vec<u8>>) {
        let mut inner = self.inner.write();
        for (key, value) in entries {
            if !inner.data.contains_key(&key) {
                inner.insert(key, value);
            }
        }
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.data.clear();
        inner.size = 0;
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
