//! Transactions
//!
//! `WriteTxn` stages one block's writes; `ReadView` reads committed state.

use std::collections::BTreeMap;

use parking_lot::RwLockReadGuard;

use crate::error::{BlockKvError, Result};

use super::{Engine, EngineInner};

/// Outcome of a successful commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitInfo {
    /// LSN of the WAL frame, `None` when nothing was staged
    pub lsn: Option<u64>,
    /// Distinct keys written
    pub writes: usize,
    /// Whether the commit triggered a MemTable flush
    pub flushed: bool,
}

/// The single writable transaction
///
/// Writes are staged in memory and reach the WAL and MemTable only on
/// `commit`. Dropping the transaction without committing discards them.
pub struct WriteTxn {
    engine: Engine,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
    staged_bytes: usize,
}

impl WriteTxn {
    pub(super) fn new(engine: Engine) -> Self {
        Self {
            engine,
            pending: BTreeMap::new(),
            staged_bytes: 0,
        }
    }

    /// Stage a write; a later set of the same key replaces the earlier one
    ///
    /// Fails with `TxnTooBig` if the staged keys and values would exceed
    /// `max_txn_bytes`. A failed set leaves the transaction unchanged.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let replaced = self
            .pending
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let size = self.staged_bytes - replaced + key.len() + value.len();
        let limit = self.engine.inner().max_txn_bytes();

        if size > limit {
            return Err(BlockKvError::TxnTooBig { size, limit });
        }

        self.pending.insert(key.to_vec(), value.to_vec());
        self.staged_bytes = size;
        Ok(())
    }

    /// Atomically persist every staged write
    pub fn commit(mut self) -> Result<CommitInfo> {
        let writes: Vec<_> = std::mem::take(&mut self.pending).into_iter().collect();
        self.staged_bytes = 0;
        // Writer slot is released when `self` drops, after the commit finished
        self.engine.inner().commit_batch(writes)
    }

    /// Throw the staged writes away
    pub fn discard(self) {
        tracing::debug!("Discarding write transaction with {} staged writes", self.len());
    }

    /// Number of distinct keys staged
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Bytes of keys and values staged
    pub fn staged_bytes(&self) -> usize {
        self.staged_bytes
    }
}

impl Drop for WriteTxn {
    fn drop(&mut self) {
        self.engine.inner().release_writer();
    }
}

/// Read-only view of committed state
///
/// Holds the engine's view lock shared, so every lookup through one view sees
/// the same set of committed blocks.
pub struct ReadView<'a> {
    inner: &'a EngineInner,
    _guard: RwLockReadGuard<'a, ()>,
}

impl<'a> ReadView<'a> {
    pub(super) fn new(inner: &'a EngineInner) -> Self {
        Self {
            _guard: inner.view_lock().read(),
            inner,
        }
    }

    /// Look up a committed key
    ///
    /// Search order:
    /// 1. MemTable (most recent blocks)
    /// 2. Entries of a flush in progress
    /// 3. Tables (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.inner.memtable().get(key) {
            return Ok(Some(value));
        }
        if let Some(value) = self.inner.frozen().and_then(|f| f.get(key).cloned()) {
            return Ok(Some(value));
        }
        self.inner.storage().get(key)
    }
}
