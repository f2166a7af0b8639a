//! WAL Writer
//!
//! Handles appending block frames to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{BlockKvError, Result};

use super::entry::{encode_frame, now_millis};
use super::WalReader;

/// Writes entries to the WAL file
pub struct WalWriter {
    /// Path of the log file
    path: PathBuf,

    /// Append-mode file handle
    file: File,

    /// LSN of the last appended entry (0 = none yet)
    current_lsn: u64,

    /// When to fsync
    sync_strategy: WalSyncStrategy,

    /// Entries appended since the last fsync
    unsynced: usize,

    /// Current file length in bytes
    len: u64,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing file is scanned so LSNs continue where it left off. The
    /// file must already be recovered: a torn or corrupt frame is an error.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let mut current_lsn = 0;
        if path.exists() {
            let mut reader = WalReader::open(path)?;
            while let Some(entry) = reader.next_entry()? {
                current_lsn = entry.lsn;
            }
            if reader.torn_tail() {
                return Err(BlockKvError::WalCorruption(format!(
                    "{} has a partial frame at offset {}; recover it first",
                    path.display(),
                    reader.valid_len()
                )));
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_lsn,
            sync_strategy,
            unsynced: 0,
            len,
        })
    }

    /// Append one block's writes as a single frame
    ///
    /// Returns the LSN assigned to the frame.
    pub fn append(&mut self, writes: &[(Vec<u8>, Vec<u8>)]) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let frame = encode_frame(lsn, now_millis(), writes)?;

        self.file.write_all(&frame).map_err(|e| {
            BlockKvError::WalWrite(format!("append lsn {} to {}: {}", lsn, self.path.display(), e))
        })?;

        self.current_lsn = lsn;
        self.len += frame.len() as u64;
        self.unsynced += 1;

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if should_sync {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every frame (their contents are durable elsewhere)
    ///
    /// LSNs keep increasing after a truncate.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.len = 0;
        self.unsynced = 0;
        Ok(())
    }

    /// Never hand out an LSN at or below `lsn`
    ///
    /// Used on open so numbering continues past blocks that already left
    /// the log for a table.
    pub fn advance_to(&mut self, lsn: u64) {
        self.current_lsn = self.current_lsn.max(lsn);
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Current file length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
