//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Recovery from a clean WAL
//! - Recovery from an empty WAL
//! - Recovery with a partial frame at the tail (truncated away)
//! - Recovery with a corrupted frame (fails, nothing skipped)

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use blockkv::config::WalSyncStrategy;
use blockkv::wal::{WalEntry, WalRecovery, WalWriter};
use blockkv::BlockKvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

/// Write blocks using WalWriter (produces a well-formed WAL)
fn write_blocks_via_writer(path: &PathBuf, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for i in 0..count {
        writer
            .append(&[
                (format!("key{}", i).into_bytes(), format!("value{}", i).into_bytes()),
                (format!("other{}", i).into_bytes(), b"x".to_vec()),
            ])
            .unwrap();
    }
}

// =============================================================================
// Clean WAL Tests
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_multiple_blocks() {
    let (_temp, wal_path) = setup_temp_wal();
    write_blocks_via_writer(&wal_path, 10);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 10);
    assert_eq!(result.entries_recovered, 10);
    assert_eq!(result.last_lsn, 10);
    assert!(!result.was_truncated);
    assert!(entries.iter().all(|e| e.writes.len() == 2));
}

// =============================================================================
// Partial Write Tests
// =============================================================================

#[test]
fn test_recover_truncates_partial_frame() {
    let (_temp, wal_path) = setup_temp_wal();
    write_blocks_via_writer(&wal_path, 3);
    let good_len = fs::metadata(&wal_path).unwrap().len();

    // Simulate a crash halfway through appending block 4
    let frame = WalEntry::new(4, vec![(b"k".to_vec(), b"v".to_vec())])
        .serialize()
        .unwrap();
    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&frame[..frame.len() / 2]).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(result.last_lsn, 3);
    assert!(result.was_truncated);
    assert_eq!(result.bytes_truncated, (frame.len() / 2) as u64);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), good_len);
}

#[test]
fn test_recovered_file_accepts_new_appends() {
    let (_temp, wal_path) = setup_temp_wal();
    write_blocks_via_writer(&wal_path, 2);
    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0xAB; 5]).unwrap();
    drop(file);

    WalRecovery::recover(&wal_path).unwrap();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.append(&[(b"n".to_vec(), b"1".to_vec())]).unwrap(), 3);

    let (entries, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 3);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_recover_fails_on_crc_mismatch() {
    let (_temp, wal_path) = setup_temp_wal();
    write_blocks_via_writer(&wal_path, 3);

    // Corrupt a byte inside the first frame's data section
    let mut bytes = fs::read(&wal_path).unwrap();
    bytes[20] ^= 0x55;
    fs::write(&wal_path, &bytes).unwrap();

    let result = WalRecovery::recover(&wal_path);
    assert!(matches!(result, Err(BlockKvError::WalCorruption(_))));

    // Nothing is truncated on corruption
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), bytes.len() as u64);
}
