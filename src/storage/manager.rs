//! Storage Manager
//!
//! Owns the set of table files in one directory.
//!
//! ## Responsibilities
//! - Discover tables on startup and drop leftovers of interrupted flushes
//! - Point reads, newest table first
//! - Turn a full MemTable into a new table
//! - Remember how far the committed log has been folded into tables

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{BlockKvError, Result};
use crate::memtable::MemTable;

use super::{sync_dir, TableMeta, TableReader, TableWriter};

const TABLE_PREFIX: &str = "table-";
const TABLE_EXT: &str = "sst";
const PARTIAL_EXT: &str = "partial";

/// The on-disk half of the store
///
/// `tables` is ordered newest first. Readers share it; only a flush takes
/// the write lock, and only to push the new table in front.
pub struct StorageManager {
    dir: PathBuf,
    tables: RwLock<Vec<TableReader>>,
    next_id: AtomicU64,
}

impl StorageManager {
    /// Open (creating if needed) the table directory
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let mut found = Vec::new();
        let mut removed = false;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().is_some_and(|ext| ext == PARTIAL_EXT) {
                tracing::warn!("Removing interrupted flush output {}", path.display());
                fs::remove_file(&path)?;
                removed = true;
                continue;
            }
            if let Some(id) = table_id(&path) {
                found.push((id, path));
            }
        }
        found.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        if removed || found.is_empty() {
            sync_dir(dir)?;
        }

        let next_id = found.first().map_or(1, |(id, _)| id + 1);
        let tables = found
            .iter()
            .map(|(_, path)| TableReader::open(path))
            .collect::<Result<Vec<_>>>()?;

        let manager = Self {
            dir: dir.to_path_buf(),
            tables: RwLock::new(tables),
            next_id: AtomicU64::new(next_id),
        };
        tracing::debug!(
            "Opened {} tables in {} (last_lsn={})",
            manager.table_count(),
            dir.display(),
            manager.last_lsn()
        );
        Ok(manager)
    }

    /// Newest stored value for `key`
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        for table in self.tables.read().iter().filter(|t| t.covers(key)) {
            if let Some(value) = table.get(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Write every entry of `memtable` to a new table and start serving it
    pub fn flush(&self, memtable: &MemTable, last_lsn: u64) -> Result<TableMeta> {
        if memtable.is_empty() {
            return Err(BlockKvError::Storage("nothing to flush".to_string()));
        }
        let table = self.build_table(memtable.iter(), last_lsn)?;
        Ok(self.install(table))
    }

    /// Write `entries` (sorted, distinct keys) to a new table file
    ///
    /// The file is written under a `.partial` name, synced, renamed and the
    /// directory synced, so once this returns the table survives a crash and
    /// a crash before that never leaves a half-written table that `open`
    /// would load. The table is not searched until passed to [`install`].
    ///
    /// [`install`]: StorageManager::install
    pub fn build_table<K, V>(
        &self,
        entries: impl IntoIterator<Item = (K, V)>,
        last_lsn: u64,
    ) -> Result<TableReader>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.join(format!("{}{:06}.{}", TABLE_PREFIX, id, TABLE_EXT));
        let partial = path.with_extension(PARTIAL_EXT);

        let mut writer = TableWriter::create(&partial)?;
        for (key, value) in entries {
            writer.append(key.as_ref(), value.as_ref())?;
        }
        if writer.entries() == 0 {
            drop(writer);
            fs::remove_file(&partial)?;
            return Err(BlockKvError::Storage("nothing to flush".to_string()));
        }
        writer.finish(last_lsn)?;

        fs::rename(&partial, &path)?;
        sync_dir(&self.dir)?;

        TableReader::open(&path)
    }

    /// Put a table built by [`build_table`] in front of every older one
    ///
    /// [`build_table`]: StorageManager::build_table
    pub fn install(&self, table: TableReader) -> TableMeta {
        let meta = table.meta().clone();
        self.tables.write().insert(0, table);

        tracing::debug!(
            "Flushed {} entries up to lsn {} into {} ({} bytes)",
            meta.entries,
            meta.last_lsn,
            meta.path.display(),
            meta.file_size
        );
        meta
    }

    /// Highest LSN already folded into a table (0 when there are none)
    pub fn last_lsn(&self) -> u64 {
        self.tables
            .read()
            .iter()
            .map(TableReader::last_lsn)
            .max()
            .unwrap_or(0)
    }

    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Metadata of every table, newest first
    pub fn tables(&self) -> Vec<TableMeta> {
        self.tables.read().iter().map(|t| t.meta().clone()).collect()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn next_table_id(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }
}

/// `table-000042.sst` → 42
fn table_id(path: &Path) -> Option<u64> {
    if path.extension()? != TABLE_EXT {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(TABLE_PREFIX)?
        .parse()
        .ok()
}
