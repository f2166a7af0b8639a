//! Table writer
//!
//! Streams sorted records into a new table file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{BlockKvError, Result};

use super::{Footer, TableMeta, FOOTER_SIZE, HEADER_SIZE, MAGIC, RECORD_PREFIX, VERSION};

/// Writes one table; records must arrive in strictly increasing key order
pub struct TableWriter {
    path: PathBuf,
    out: BufWriter<File>,
    /// Offset where the next record starts
    offset: u64,
    index: Vec<(Vec<u8>, u64)>,
    records_crc: crc32fast::Hasher,
}

impl TableWriter {
    /// Create (or replace) the file at `path` and write its header
    pub fn create(path: &Path) -> Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(MAGIC)?;
        out.write_all(&VERSION.to_le_bytes())?;
        out.write_all(&[0u8; 2])?;

        Ok(Self {
            path: path.to_path_buf(),
            out,
            offset: HEADER_SIZE,
            index: Vec::new(),
            records_crc: crc32fast::Hasher::new(),
        })
    }

    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some((prev, _)) = self.index.last() {
            if key <= prev.as_slice() {
                return Err(BlockKvError::Storage(format!(
                    "{}: key {:?} not after {:?}",
                    self.path.display(),
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(prev)
                )));
            }
        }

        let mut prefix = [0u8; RECORD_PREFIX];
        prefix[..4].copy_from_slice(&field_len(key.len())?.to_le_bytes());
        prefix[4..].copy_from_slice(&field_len(value.len())?.to_le_bytes());

        self.out.write_all(&prefix)?;
        self.out.write_all(key)?;
        self.out.write_all(value)?;
        self.records_crc.update(&prefix);
        self.records_crc.update(key);
        self.records_crc.update(value);

        self.index.push((key.to_vec(), self.offset));
        self.offset += (RECORD_PREFIX + key.len() + value.len()) as u64;
        Ok(())
    }

    pub fn entries(&self) -> u64 {
        self.index.len() as u64
    }

    /// Write index and footer, then sync the file
    ///
    /// `last_lsn` is the newest block whose writes the table contains.
    pub fn finish(mut self, last_lsn: u64) -> Result<TableMeta> {
        let index_bytes = bincode::serialize(&self.index)?;
        let footer = Footer {
            entries: self.entries(),
            index_offset: self.offset,
            last_lsn,
            records_crc: self.records_crc.finalize(),
            index_crc: crc32fast::hash(&index_bytes),
        };

        self.out.write_all(&index_bytes)?;
        self.out.write_all(&footer.encode())?;
        self.out.flush()?;
        self.out
            .get_ref()
            .sync_all()
            .map_err(|e| BlockKvError::Storage(format!("sync {}: {}", self.path.display(), e)))?;

        let mut index = self.index.into_iter();
        let first_key = index.next().map(|(k, _)| k).unwrap_or_default();
        let last_key = index.last().map(|(k, _)| k).unwrap_or_else(|| first_key.clone());

        Ok(TableMeta {
            path: self.path,
            entries: footer.entries,
            last_lsn,
            first_key,
            last_key,
            file_size: footer.index_offset + index_bytes.len() as u64 + FOOTER_SIZE,
        })
    }
}

fn field_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| BlockKvError::Storage(format!("field of {} bytes too large for a table", len)))
}
