//! Table files
//!
//! A table is one flushed MemTable: the committed state of every key it
//! holds as of `last_lsn`, sorted by key and never modified afterwards.
//!
//! ## File Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (8): Magic "BKVT" (4) | Version u16 (2) | Reserved (2) │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Records: [KeyLen u32][ValLen u32][Key][Value] ...             │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Index: bincode Vec<(key, record offset)>                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Footer (32): Entries u64 | IndexOffset u64 | LastLsn u64 |    │
//! │              RecordsCrc u32 | IndexCrc u32                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! All integers are little-endian.

mod reader;
mod writer;

use std::path::PathBuf;

use bytes::{Buf, BufMut, BytesMut};

pub use reader::TableReader;
pub use writer::TableWriter;

pub(crate) const MAGIC: &[u8; 4] = b"BKVT";
pub(crate) const VERSION: u16 = 1;
pub(crate) const HEADER_SIZE: u64 = 8;
pub(crate) const FOOTER_SIZE: u64 = 32;

/// Per-record prefix: key length + value length
pub(crate) const RECORD_PREFIX: usize = 8;

/// What is known about a table without touching its records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    pub path: PathBuf,
    pub entries: u64,
    /// LSN of the newest block folded into this table
    pub last_lsn: u64,
    pub first_key: Vec<u8>,
    pub last_key: Vec<u8>,
    pub file_size: u64,
}

impl TableMeta {
    /// False only when `key` is certainly not in the table
    pub fn covers(&self, key: &[u8]) -> bool {
        self.entries > 0 && key >= self.first_key.as_slice() && key <= self.last_key.as_slice()
    }
}

/// Fixed-size trailer of a table file
#[derive(Debug, Clone, Copy)]
pub(crate) struct Footer {
    pub entries: u64,
    pub index_offset: u64,
    pub last_lsn: u64,
    pub records_crc: u32,
    pub index_crc: u32,
}

impl Footer {
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(FOOTER_SIZE as usize);
        buf.put_u64_le(self.entries);
        buf.put_u64_le(self.index_offset);
        buf.put_u64_le(self.last_lsn);
        buf.put_u32_le(self.records_crc);
        buf.put_u32_le(self.index_crc);
        buf
    }

    pub fn decode(mut raw: &[u8]) -> Self {
        Self {
            entries: raw.get_u64_le(),
            index_offset: raw.get_u64_le(),
            last_lsn: raw.get_u64_le(),
            records_crc: raw.get_u32_le(),
            index_crc: raw.get_u32_le(),
        }
    }
}
