//! Engine Module
//!
//! The embedded transactional store that coordinates all storage components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Hand out at most one write transaction at a time
//! - Hand out any number of committed-only read views
//! - Trigger flushes when MemTable is full
//! - Manage crash recovery on startup

mod txn;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{BlockKvError, Result};
use crate::memtable::MemTable;
use crate::storage::{sync_dir, StorageManager};
use crate::wal::{WalRecovery, WalWriter};

pub use txn::{CommitInfo, ReadView, WriteTxn};

/// The storage engine
///
/// Cheap to clone: clones share the same underlying store.
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** are staged inside a [`WriteTxn`] and touch no shared state
///   until commit. Only one `WriteTxn` may be live (`writer_active`).
/// - **Commit** appends one WAL frame, then applies the whole batch to the
///   MemTable while holding `view_lock` exclusively.
/// - **Reads** go through a [`ReadView`], which holds `view_lock` shared for
///   its lifetime: a view sees every write of a committed block or none of
///   them, and never sees staged writes.
/// - **Flush** freezes the MemTable under `view_lock`, writes the table with
///   only the WAL lock held (readers keep reading the frozen entries), then
///   swaps the table in under `view_lock` again.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    /// Engine configuration
    config: Config,

    /// Directory holding the table files
    storage_dir: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table for recently committed writes
    memtable: MemTable,

    /// MemTable contents being written out by a flush
    frozen: RwLock<Option<Arc<BTreeMap<Vec<u8>, Vec<u8>>>>>,

    /// Persistent storage manager
    storage: StorageManager,

    /// Shared by read views, exclusive while a commit or flush publishes data
    view_lock: RwLock<()>,

    /// Set while a WriteTxn is live
    writer_active: AtomicBool,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const TABLE_DIR: &'static str = "tables";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open the table directory; its newest table says which LSN is durable
    /// 2. Replay WAL frames past that LSN into the MemTable
    /// 3. Fold the replayed blocks into a table and empty the WAL
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::TABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        sync_dir(&config.data_dir)?;
        let durable_lsn = storage.last_lsn();
        let memtable = MemTable::new();

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            // Frames at or below durable_lsn were flushed before the WAL
            // could be truncated
            let mut replayed = 0;
            for entry in entries.into_iter().filter(|e| e.lsn > durable_lsn) {
                memtable.apply_batch(entry.writes);
                replayed += 1;
            }

            if recovery.entries_recovered > 0 || recovery.was_truncated {
                tracing::info!(
                    "WAL recovery: {} frames read, {} replayed, last_lsn={}, truncated={}",
                    recovery.entries_recovered,
                    replayed,
                    recovery.last_lsn,
                    recovery.was_truncated
                );
            }
        }

        let mut wal = WalWriter::open(&wal_path, config.storage.wal_sync)?;
        wal.advance_to(durable_lsn);

        if !memtable.is_empty() {
            tracing::info!(
                "Flushing {} recovered entries (through lsn {})",
                memtable.entry_count(),
                wal.current_lsn()
            );
            storage.flush(&memtable, wal.current_lsn())?;
            memtable.clear();
        }
        if !wal.is_empty() {
            wal.truncate()?;
        }

        tracing::info!(
            "Engine opened at {} ({} tables, last_lsn={})",
            config.data_dir.display(),
            storage.table_count(),
            wal.current_lsn()
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                storage_dir,
                wal: Mutex::new(wal),
                memtable,
                frozen: RwLock::new(None),
                storage,
                view_lock: RwLock::new(()),
                writer_active: AtomicBool::new(false),
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Start the (single) write transaction
    ///
    /// Fails with `WriterBusy` while another `WriteTxn` is live.
    pub fn begin_write(&self) -> Result<WriteTxn> {
        self.inner
            .writer_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BlockKvError::WriterBusy)?;

        Ok(WriteTxn::new(self.clone()))
    }

    /// Open a read-only view of committed state
    ///
    /// Keep views short-lived: a commit waits for live views to drop.
    pub fn view(&self) -> ReadView<'_> {
        ReadView::new(&self.inner)
    }

    /// Read one committed key (short-lived view)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.view().get(key)
    }

    /// Flush memtable to disk and empty the WAL
    pub fn flush(&self) -> Result<()> {
        let mut wal = self.inner.wal.lock();
        self.inner.flush_locked(&mut wal)
    }

    /// Close the engine gracefully
    ///
    /// Flushes any committed data still in the MemTable and syncs the WAL.
    /// Staged writes of a live transaction are not affected.
    pub fn close(&self) -> Result<()> {
        let mut wal = self.inner.wal.lock();
        self.inner.flush_locked(&mut wal)?;
        wal.sync()?;
        tracing::info!("Engine closed at {}", self.inner.config.data_dir.display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.inner.config.data_dir
    }

    /// Directory holding the table files
    pub fn storage_dir(&self) -> &Path {
        &self.inner.storage_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.inner.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.inner.memtable.entry_count()
    }

    /// Number of table files
    pub fn table_count(&self) -> usize {
        self.inner.storage.table_count()
    }

    /// LSN of the last committed (non-empty) block
    pub fn last_lsn(&self) -> u64 {
        self.inner.wal.lock().current_lsn()
    }

    /// Current WAL length in bytes
    pub fn wal_size(&self) -> u64 {
        self.inner.wal.lock().len()
    }

    /// Whether a write transaction is live
    pub fn has_writer(&self) -> bool {
        self.inner.writer_active.load(Ordering::Acquire)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn inner(&self) -> &EngineInner {
        &self.inner
    }
}

impl EngineInner {
    /// Persist and publish one block (called by `WriteTxn::commit`)
    pub(crate) fn commit_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<CommitInfo> {
        if writes.is_empty() {
            return Ok(CommitInfo::default());
        }

        let mut wal = self.wal.lock();

        // Step 1: WAL first; after this the block survives a crash
        let lsn = wal.append(&writes)?;
        let count = writes.len();

        // Step 2: publish to readers in one step
        {
            let _publish = self.view_lock.write();
            self.memtable.apply_batch(writes);
        }

        // Step 3: flush if the MemTable grew past its limit
        let flushed = self
            .memtable
            .should_flush(self.config.storage.memtable_size_limit);
        if flushed {
            self.flush_locked(&mut wal)?;
        }

        Ok(CommitInfo {
            lsn: Some(lsn),
            writes: count,
            flushed,
        })
    }

    /// Flush implementation (caller holds the WAL lock)
    fn flush_locked(&self, wal: &mut WalWriter) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        // Readers switch from the MemTable to the frozen copy in one step
        let frozen = {
            let _publish = self.view_lock.write();
            let frozen = Arc::new(self.memtable.take());
            *self.frozen.write() = Some(Arc::clone(&frozen));
            frozen
        };

        // Commits wait on the WAL lock; reads go on
        let built = self.storage.build_table(frozen.iter(), wal.current_lsn());
        let table = match built {
            Ok(table) => table,
            Err(e) => {
                let _publish = self.view_lock.write();
                self.frozen.write().take();
                self.memtable
                    .restore(Arc::try_unwrap(frozen).unwrap_or_else(|f| (*f).clone()));
                return Err(e);
            }
        };

        {
            let _publish = self.view_lock.write();
            self.storage.install(table);
            self.frozen.write().take();
        }

        // Entries are now durable in a table
        wal.truncate()?;
        Ok(())
    }

    pub(crate) fn release_writer(&self) {
        self.writer_active.store(false, Ordering::Release);
    }

    pub(crate) fn max_txn_bytes(&self) -> usize {
        self.config.storage.max_txn_bytes
    }

    pub(crate) fn memtable(&self) -> &MemTable {
        &self.memtable
    }

    pub(crate) fn frozen(&self) -> Option<Arc<BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.frozen.read().clone()
    }

    pub(crate) fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub(crate) fn view_lock(&self) -> &RwLock<()> {
        &self.view_lock
    }
}
