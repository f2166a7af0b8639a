//! Table reader
//!
//! Verifies a table once on open, then serves point lookups from an
//! in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use parking_lot::Mutex;

use crate::error::{BlockKvError, Result};

use super::{Footer, TableMeta, FOOTER_SIZE, HEADER_SIZE, MAGIC, RECORD_PREFIX, VERSION};

/// An open, verified table
///
/// Lookups take `&self`; the file handle is shared behind a mutex.
pub struct TableReader {
    meta: TableMeta,
    index: BTreeMap<Vec<u8>, u64>,
    file: Mutex<File>,
}

impl TableReader {
    /// Open a table and check both of its checksums
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(corrupt(path, format!("only {} bytes", file_size)));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        if &header[..4] != MAGIC {
            return Err(corrupt(path, "not a table file".to_string()));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(corrupt(path, format!("format version {} unsupported", version)));
        }

        let mut raw_footer = [0u8; FOOTER_SIZE as usize];
        file.seek(SeekFrom::Start(file_size - FOOTER_SIZE))?;
        file.read_exact(&mut raw_footer)?;
        let footer = Footer::decode(&raw_footer);

        let index_end = file_size - FOOTER_SIZE;
        if footer.index_offset < HEADER_SIZE || footer.index_offset > index_end {
            return Err(corrupt(
                path,
                format!("index offset {} outside file", footer.index_offset),
            ));
        }

        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let records_crc = checksum(&mut file, footer.index_offset - HEADER_SIZE)?;
        if records_crc != footer.records_crc {
            return Err(corrupt(path, "records checksum mismatch".to_string()));
        }

        let mut raw_index = vec![0u8; (index_end - footer.index_offset) as usize];
        file.read_exact(&mut raw_index)?;
        if crc32fast::hash(&raw_index) != footer.index_crc {
            return Err(corrupt(path, "index checksum mismatch".to_string()));
        }

        let entries: Vec<(Vec<u8>, u64)> = bincode::deserialize(&raw_index)?;
        if entries.len() as u64 != footer.entries {
            return Err(corrupt(
                path,
                format!("footer counts {} entries, index has {}", footer.entries, entries.len()),
            ));
        }
        if let Some((_, offset)) = entries.iter().find(|(_, off)| *off >= footer.index_offset) {
            return Err(corrupt(path, format!("record offset {} past records", offset)));
        }

        let first_key = entries.first().map(|(k, _)| k.clone()).unwrap_or_default();
        let last_key = entries.last().map(|(k, _)| k.clone()).unwrap_or_default();
        let index: BTreeMap<_, _> = entries.into_iter().collect();

        Ok(Self {
            meta: TableMeta {
                path: path.to_path_buf(),
                entries: footer.entries,
                last_lsn: footer.last_lsn,
                first_key,
                last_key,
                file_size,
            },
            index,
            file: Mutex::new(file),
        })
    }

    /// Value stored for `key`, if this table has it
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(&offset) = self.index.get(key) else {
            return Ok(None);
        };

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut prefix = [0u8; RECORD_PREFIX];
        file.read_exact(&mut prefix)?;
        let key_len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let val_len = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]) as usize;
        if key_len != key.len() {
            return Err(corrupt(&self.meta.path, format!("record at {} has wrong key", offset)));
        }

        let mut record = vec![0u8; key_len + val_len];
        file.read_exact(&mut record)?;
        if &record[..key_len] != key {
            return Err(corrupt(&self.meta.path, format!("record at {} has wrong key", offset)));
        }

        Ok(Some(record.split_off(key_len)))
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn last_lsn(&self) -> u64 {
        self.meta.last_lsn
    }

    pub fn entries(&self) -> u64 {
        self.meta.entries
    }

    pub fn covers(&self, key: &[u8]) -> bool {
        self.meta.covers(key)
    }
}

/// CRC32 of the next `len` bytes of `file`
fn checksum(file: &mut File, len: u64) -> Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut section = file.take(len);
    let mut chunk = [0u8; 8192];
    let mut seen = 0u64;
    loop {
        let n = section.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
        seen += n as u64;
    }
    if seen != len {
        return Err(BlockKvError::Storage(format!(
            "short read: {} of {} bytes",
            seen, len
        )));
    }
    Ok(hasher.finalize())
}

fn corrupt(path: &Path, detail: String) -> BlockKvError {
    BlockKvError::Storage(format!("table {}: {}", path.display(), detail))
}
