//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of frames (blocks) successfully recovered
    pub entries_recovered: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial frame removed)
    pub was_truncated: bool,

    /// Bytes removed from the tail
    pub bytes_truncated: u64,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all intact frames
    /// 2. Truncate a partial frame at the end (a block whose commit never returned)
    /// 3. Return all valid entries in order
    ///
    /// A checksum mismatch is not skipped: it fails with `WalCorruption`.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut last_lsn = 0;

        while let Some(entry) = reader.next_entry()? {
            last_lsn = entry.lsn;
            entries.push(entry);
        }

        let file_len = std::fs::metadata(path)?.len();
        let valid_len = reader.valid_len();
        let was_truncated = reader.torn_tail() && file_len > valid_len;

        if was_truncated {
            tracing::warn!(
                "WAL {}: dropping {} bytes of partial frame after lsn {}",
                path.display(),
                file_len - valid_len,
                last_lsn
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        let result = RecoveryResult {
            entries_recovered: entries.len() as u64,
            last_lsn,
            was_truncated,
            bytes_truncated: if was_truncated { file_len - valid_len } else { 0 },
        };

        Ok((entries, result))
    }
}
