//! Tests for table files
//!
//! These tests verify:
//! - Writing and reading back records
//! - Key ordering enforcement
//! - Checksum and layout validation on open

use std::fs;
use std::path::PathBuf;

use blockkv::storage::{TableReader, TableWriter};
use blockkv::BlockKvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.sst");
    (temp_dir, path)
}

fn write_table(path: &PathBuf, records: &[(&[u8], &[u8])], last_lsn: u64) {
    let mut writer = TableWriter::create(path).unwrap();
    for (key, value) in records {
        writer.append(key, value).unwrap();
    }
    writer.finish(last_lsn).unwrap();
}

fn flip_byte(path: &PathBuf, offset: usize) {
    let mut bytes = fs::read(path).unwrap();
    bytes[offset] ^= 0xff;
    fs::write(path, &bytes).unwrap();
}

// =============================================================================
// Write / Read Tests
// =============================================================================

#[test]
fn test_finish_returns_meta() {
    let (_temp, path) = setup_temp_table();

    let mut writer = TableWriter::create(&path).unwrap();
    writer.append(b"apple", b"red").unwrap();
    writer.append(b"banana", b"yellow").unwrap();
    assert_eq!(writer.entries(), 2);
    let meta = writer.finish(7).unwrap();

    assert_eq!(meta.entries, 2);
    assert_eq!(meta.last_lsn, 7);
    assert_eq!(meta.first_key, b"apple".to_vec());
    assert_eq!(meta.last_key, b"banana".to_vec());
    assert_eq!(meta.file_size, fs::metadata(&path).unwrap().len());
    assert!(meta.covers(b"avocado"));
    assert!(!meta.covers(b"cherry"));
}

#[test]
fn test_reader_meta_matches_writer() {
    let (_temp, path) = setup_temp_table();

    let mut writer = TableWriter::create(&path).unwrap();
    writer.append(b"only", b"one").unwrap();
    let written = writer.finish(3).unwrap();

    let reader = TableReader::open(&path).unwrap();
    assert_eq!(reader.meta(), &written);
    assert_eq!(reader.last_lsn(), 3);
}

#[test]
fn test_read_back_records() {
    let (_temp, path) = setup_temp_table();
    write_table(
        &path,
        &[(b"a", b"1"), (b"b", b""), (b"c", b"value with = sign")],
        1,
    );

    let reader = TableReader::open(&path).unwrap();

    assert_eq!(reader.entries(), 3);
    assert_eq!(reader.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(reader.get(b"b").unwrap(), Some(Vec::new()));
    assert_eq!(reader.get(b"c").unwrap(), Some(b"value with = sign".to_vec()));
    assert_eq!(reader.get(b"bb").unwrap(), None);
    assert_eq!(reader.get(b"d").unwrap(), None);
}

#[test]
fn test_empty_table() {
    let (_temp, path) = setup_temp_table();
    write_table(&path, &[], 0);

    let reader = TableReader::open(&path).unwrap();

    assert_eq!(reader.entries(), 0);
    assert!(!reader.covers(b""));
    assert_eq!(reader.get(b"anything").unwrap(), None);
}

#[test]
fn test_reader_shared_across_threads() {
    let (_temp, path) = setup_temp_table();
    let keys: Vec<Vec<u8>> = (0..100).map(|i| format!("key{:03}", i).into_bytes()).collect();
    let mut writer = TableWriter::create(&path).unwrap();
    for key in &keys {
        writer.append(key, key).unwrap();
    }
    writer.finish(1).unwrap();

    let reader = TableReader::open(&path).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for key in &keys {
                    assert_eq!(reader.get(key).unwrap().as_deref(), Some(key.as_slice()));
                }
            });
        }
    });
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_append_rejects_out_of_order_keys() {
    let (_temp, path) = setup_temp_table();

    let mut writer = TableWriter::create(&path).unwrap();
    writer.append(b"b", b"1").unwrap();

    assert!(writer.append(b"a", b"2").is_err());
    assert!(writer.append(b"b", b"3").is_err());
    assert_eq!(writer.entries(), 1);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_open_rejects_bad_magic() {
    let (_temp, path) = setup_temp_table();
    write_table(&path, &[(b"a", b"1")], 1);

    flip_byte(&path, 0);

    assert!(matches!(TableReader::open(&path), Err(BlockKvError::Storage(_))));
}

#[test]
fn test_open_rejects_record_corruption() {
    let (_temp, path) = setup_temp_table();
    write_table(&path, &[(b"key", b"value")], 1);

    // First value byte: header + record prefix + key
    flip_byte(&path, 8 + 8 + 3);

    assert!(matches!(TableReader::open(&path), Err(BlockKvError::Storage(_))));
}

#[test]
fn test_open_rejects_index_corruption() {
    let (_temp, path) = setup_temp_table();
    write_table(&path, &[(b"key", b"value")], 1);

    // Last index byte sits right before the 32-byte footer
    let len = fs::metadata(&path).unwrap().len() as usize;
    flip_byte(&path, len - 32 - 1);

    assert!(matches!(TableReader::open(&path), Err(BlockKvError::Storage(_))));
}

#[test]
fn test_open_rejects_short_file() {
    let (_temp, path) = setup_temp_table();
    fs::write(&path, b"BKVT").unwrap();

    assert!(TableReader::open(&path).is_err());
}
