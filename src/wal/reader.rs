//! WAL Reader
//!
//! Handles reading frames from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{BlockKvError, Result};

use super::entry::compute_crc;
use super::{WalEntry, HEADER_SIZE};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last intact frame
    valid_len: u64,

    /// Set once a short trailing frame has been seen
    torn_tail: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            valid_len: 0,
            torn_tail: false,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// - `Ok(Some(entry))`: an intact frame
    /// - `Ok(None)`: end of log, or a torn frame at the tail (see `torn_tail`)
    /// - `Err(WalCorruption)`: a complete frame failed its checksum
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        if self.torn_tail {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        match read_full(&mut self.reader, &mut header)? {
            0 => return Ok(None),
            n if n < HEADER_SIZE => {
                self.torn_tail = true;
                return Ok(None);
            }
            _ => {}
        }

        let lsn = u64::from_le_bytes(header[0..8].try_into().unwrap_or_default());
        let crc = u32::from_le_bytes(header[8..12].try_into().unwrap_or_default());
        let len = u32::from_le_bytes(header[12..16].try_into().unwrap_or_default()) as usize;

        // Grows with what is actually on disk; a garbage length cannot over-allocate
        let mut data = Vec::new();
        (&mut self.reader).take(len as u64).read_to_end(&mut data)?;
        if data.len() < len {
            self.torn_tail = true;
            return Ok(None);
        }

        if compute_crc(&data) != crc {
            return Err(BlockKvError::WalCorruption(format!(
                "CRC mismatch for lsn {} at offset {}",
                lsn, self.valid_len
            )));
        }

        let entry = WalEntry::deserialize(&data)?;
        if entry.lsn != lsn {
            return Err(BlockKvError::WalCorruption(format!(
                "frame header lsn {} does not match entry lsn {}",
                lsn, entry.lsn
            )));
        }

        self.valid_len += (HEADER_SIZE + len) as u64;
        Ok(Some(entry))
    }

    /// Iterate over all intact entries
    pub fn entries(self) -> WalIterator {
        WalIterator { reader: self }
    }

    /// Offset just past the last intact frame read so far
    pub fn valid_len(&self) -> u64 {
        self.valid_len
    }

    /// Whether iteration stopped on a partial frame
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_entry().transpose()
    }
}

/// Fill `buf` as far as the file allows; returns bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
