//! WAL Entry definitions
//!
//! Defines the structure of individual WAL frames.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{BlockKvError, Result};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL: all writes of one committed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,

    /// Key/value writes in the order they were staged
    pub writes: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            lsn,
            timestamp: now_millis(),
            writes,
        }
    }

    /// Encode as a complete frame: header + data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        encode_frame(self.lsn, self.timestamp, &self.writes)
    }

    /// Decode the data section of a frame after its CRC was checked
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }

    /// Total number of key and value bytes carried
    pub fn payload_bytes(&self) -> usize {
        self.writes.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

/// Borrowed mirror of `WalEntry`; bincode encodes both identically
#[derive(Serialize)]
struct WalEntryRef<'a> {
    lsn: u64,
    timestamp: u64,
    writes: &'a [(Vec<u8>, Vec<u8>)],
}

/// Encode a frame without taking ownership of the writes
pub(crate) fn encode_frame(
    lsn: u64,
    timestamp: u64,
    writes: &[(Vec<u8>, Vec<u8>)],
) -> Result<Vec<u8>> {
    let data = bincode::serialize(&WalEntryRef {
        lsn,
        timestamp,
        writes,
    })?;
    let len = u32::try_from(data.len()).map_err(|_| {
        BlockKvError::WalWrite(format!("entry of {} bytes exceeds frame limit", data.len()))
    })?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
    frame.extend_from_slice(&lsn.to_le_bytes());
    frame.extend_from_slice(&compute_crc(&data).to_le_bytes());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&data);
    Ok(frame)
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// CRC32 over a frame's data section
pub(crate) fn compute_crc(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
