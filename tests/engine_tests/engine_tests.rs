//! Tests for Engine
//!
//! These tests verify:
//! - Commit visibility and the WAL frame per block
//! - Flush to a table file
//! - Crash recovery from WAL
//! - Engine lifecycle (open/close)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::thread;

use blockkv::config::{Config, WalSyncStrategy};
use blockkv::engine::Engine;
use blockkv::BlockKvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(path: &Path, memtable_size_limit: usize) -> Config {
    Config::builder()
        .data_dir(path)
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .memtable_size_limit(memtable_size_limit)
        .build()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
    (temp_dir, engine)
}

fn commit_block(engine: &Engine, writes: &[(&str, &str)]) {
    let mut txn = engine.begin_write().unwrap();
    for (key, value) in writes {
        txn.set(key.as_bytes(), value.as_bytes()).unwrap();
    }
    txn.commit().unwrap();
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");

    let engine = Engine::open_path(&data_dir).unwrap();

    assert!(data_dir.is_dir());
    assert!(engine.storage_dir().is_dir());
    assert!(data_dir.join("wal.log").exists());
    assert_eq!(engine.data_dir(), data_dir.as_path());
    assert_eq!(engine.table_count(), 0);
    assert!(!engine.has_writer());
}

#[test]
fn test_get_missing_key() {
    let (_temp, engine) = setup_temp_engine();
    assert_eq!(engine.get(b"nothing").unwrap(), None);
}

// =============================================================================
// Commit Tests
// =============================================================================

#[test]
fn test_commit_makes_writes_visible() {
    let (_temp, engine) = setup_temp_engine();

    commit_block(&engine, &[("name", "satoshi"), ("coin", "btc")]);

    assert_eq!(engine.get(b"name").unwrap(), Some(b"satoshi".to_vec()));
    assert_eq!(engine.get(b"coin").unwrap(), Some(b"btc".to_vec()));
    assert_eq!(engine.memtable_entry_count(), 2);
}

#[test]
fn test_one_wal_frame_per_block() {
    let (_temp, engine) = setup_temp_engine();

    commit_block(&engine, &[("a", "1"), ("b", "2"), ("c", "3")]);
    assert_eq!(engine.last_lsn(), 1);

    commit_block(&engine, &[("d", "4")]);
    assert_eq!(engine.last_lsn(), 2);
    assert!(engine.wal_size() > 0);
}

#[test]
fn test_empty_commit_writes_nothing() {
    let (_temp, engine) = setup_temp_engine();

    let txn = engine.begin_write().unwrap();
    let info = txn.commit().unwrap();

    assert_eq!(info.lsn, None);
    assert_eq!(info.writes, 0);
    assert_eq!(engine.wal_size(), 0);
    assert_eq!(engine.last_lsn(), 0);
}

#[test]
fn test_later_block_overwrites_earlier() {
    let (_temp, engine) = setup_temp_engine();

    commit_block(&engine, &[("k", "v1")]);
    commit_block(&engine, &[("k", "v2")]);

    assert_eq!(engine.get(b"k").unwrap(), Some(b"v2".to_vec()));
}

// =============================================================================
// Flush Tests
// =============================================================================

#[test]
fn test_commit_triggers_flush() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(temp_dir.path(), 100)).unwrap();

    let mut txn = engine.begin_write().unwrap();
    txn.set(b"big", &[b'x'; 200]).unwrap();
    let info = txn.commit().unwrap();

    assert!(info.flushed);
    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.wal_size(), 0);
    assert_eq!(engine.get(b"big").unwrap(), Some(vec![b'x'; 200]));
}

#[test]
fn test_manual_flush() {
    let (_temp, engine) = setup_temp_engine();
    commit_block(&engine, &[("a", "1")]);

    engine.flush().unwrap();

    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.memtable_size(), 0);
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));

    // Nothing left to flush
    engine.flush().unwrap();
    assert_eq!(engine.table_count(), 1);
}

#[test]
fn test_memtable_shadows_table() {
    let (_temp, engine) = setup_temp_engine();

    commit_block(&engine, &[("k", "flushed")]);
    engine.flush().unwrap();
    commit_block(&engine, &[("k", "fresh")]);

    assert_eq!(engine.get(b"k").unwrap(), Some(b"fresh".to_vec()));
}

#[test]
fn test_commit_reaching_limit_exactly_flushes() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(temp_dir.path(), 5)).unwrap();

    let mut txn = engine.begin_write().unwrap();
    txn.set(b"k", b"vvvv").unwrap();
    let info = txn.commit().unwrap();

    assert!(info.flushed);
    assert_eq!(engine.table_count(), 1);
}

#[test]
fn test_failed_flush_keeps_entries() {
    let (_temp, engine) = setup_temp_engine();
    commit_block(&engine, &[("a", "1"), ("b", "2")]);
    let wal_size = engine.wal_size();

    fs::remove_dir_all(engine.storage_dir()).unwrap();
    assert!(matches!(engine.flush(), Err(BlockKvError::Io(_))));

    // Still readable, still in the WAL
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.memtable_entry_count(), 2);
    assert_eq!(engine.wal_size(), wal_size);

    fs::create_dir_all(engine.storage_dir()).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_reads_continue_across_flushes() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(temp_dir.path(), 256)).unwrap();
    commit_block(&engine, &[("fixed", "v")]);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    assert_eq!(engine.get(b"fixed").unwrap(), Some(b"v".to_vec()));
                }
            })
        })
        .collect();

    for i in 0..100 {
        let key = format!("key{:03}", i);
        commit_block(&engine, &[(key.as_str(), "0123456789012345678901234567890123456789")]);
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert!(engine.table_count() > 1);
    assert_eq!(engine.get(b"key000").unwrap().map(|v| v.len()), Some(40));
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_close_and_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
        commit_block(&engine, &[("name", "satoshi")]);
        engine.close().unwrap();
    }

    let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
    assert_eq!(engine.get(b"name").unwrap(), Some(b"satoshi".to_vec()));
}

#[test]
fn test_recover_from_wal_without_close() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
        commit_block(&engine, &[("a", "1"), ("b", "2")]);
        commit_block(&engine, &[("a", "3")]);
        // Dropped without close: data only lives in the WAL
        assert_eq!(engine.table_count(), 0);
    }

    let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();

    assert_eq!(engine.get(b"a").unwrap(), Some(b"3".to_vec()));
    assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.wal_size(), 0);
    assert_eq!(engine.last_lsn(), 2);
}

#[test]
fn test_lsn_continues_across_restarts() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
        commit_block(&engine, &[("a", "1")]);
        commit_block(&engine, &[("b", "2")]);
        engine.close().unwrap();
    }

    let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
    assert_eq!(engine.last_lsn(), 2);

    let mut txn = engine.begin_write().unwrap();
    txn.set(b"c", b"3").unwrap();
    assert_eq!(txn.commit().unwrap().lsn, Some(3));
}

#[test]
fn test_frames_already_in_a_table_are_not_replayed() {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("wal.log");

    {
        let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
        commit_block(&engine, &[("a", "1")]);
        let stale_wal = fs::read(&wal_path).unwrap();

        engine.flush().unwrap();
        assert_eq!(engine.table_count(), 1);

        // Crash after the table was renamed into place, before the WAL was emptied
        fs::write(&wal_path, stale_wal).unwrap();
    }

    let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();

    assert_eq!(engine.table_count(), 1);
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.last_lsn(), 1);
}

#[test]
fn test_uncommitted_writes_not_recovered() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
        commit_block(&engine, &[("kept", "1")]);
        let mut txn = engine.begin_write().unwrap();
        txn.set(b"lost", b"2").unwrap();
        // Crash before commit
        drop(txn);
    }

    let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
    assert_eq!(engine.get(b"kept").unwrap(), Some(b"1".to_vec()));
    assert_eq!(engine.get(b"lost").unwrap(), None);
}

#[test]
fn test_recover_drops_partial_block() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
        commit_block(&engine, &[("a", "1")]);
    }

    // A block whose commit never returned: header only
    let wal_path = temp_dir.path().join("wal.log");
    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[2, 0, 0, 0, 0, 0, 0, 0, 9, 9]).unwrap();
    drop(file);

    let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
    assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn test_corrupt_wal_fails_open() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(temp_dir.path(), 1024 * 1024)).unwrap();
        commit_block(&engine, &[("a", "1")]);
    }

    let wal_path = temp_dir.path().join("wal.log");
    let mut bytes = fs::read(&wal_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(&wal_path, &bytes).unwrap();

    let result = Engine::open(config_for(temp_dir.path(), 1024 * 1024));
    assert!(matches!(result, Err(BlockKvError::WalCorruption(_))));
}
