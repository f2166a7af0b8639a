//! Storage Module
//!
//! Immutable, sorted table files holding everything flushed out of the
//! MemTable.
//!
//! Only point reads and point writes exist in this store, so there is no
//! compaction and no range scan: a key lives in the newest table that has
//! it, and older tables are never rewritten.

mod manager;
mod table;

use std::path::Path;

use crate::error::Result;

pub use manager::StorageManager;
pub use table::{TableMeta, TableReader, TableWriter};

/// Make entries created, renamed or removed in `dir` durable
///
/// A rename lives in the directory, not in the file, so syncing the file
/// alone does not keep a freshly flushed table across a power cut.
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> Result<()> {
    std::fs::File::open(dir)?.sync_all()?;
    Ok(())
}

/// No directory handle to sync on this platform
#[cfg(not(unix))]
pub fn sync_dir(dir: &Path) -> Result<()> {
    let _ = dir;
    Ok(())
}
