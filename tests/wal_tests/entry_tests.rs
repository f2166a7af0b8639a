//! Tests for WalEntry framing
//!
//! These tests verify:
//! - Frame header layout (LSN, CRC, length)
//! - Decoding the data section back into an entry

use blockkv::wal::{WalEntry, HEADER_SIZE};

fn sample_entry() -> WalEntry {
    WalEntry::new(
        7,
        vec![
            (b"alpha".to_vec(), b"1".to_vec()),
            (b"beta".to_vec(), b"".to_vec()),
        ],
    )
}

#[test]
fn test_frame_header_layout() {
    let entry = sample_entry();
    let frame = entry.serialize().unwrap();

    let lsn = u64::from_le_bytes(frame[0..8].try_into().unwrap());
    let crc = u32::from_le_bytes(frame[8..12].try_into().unwrap());
    let len = u32::from_le_bytes(frame[12..16].try_into().unwrap()) as usize;

    assert_eq!(lsn, 7);
    assert_eq!(frame.len(), HEADER_SIZE + len);
    assert_eq!(crc, crc32fast::hash(&frame[HEADER_SIZE..]));
}

#[test]
fn test_data_section_decodes() {
    let entry = sample_entry();
    let frame = entry.serialize().unwrap();

    let decoded = WalEntry::deserialize(&frame[HEADER_SIZE..]).unwrap();

    assert_eq!(decoded, entry);
}

#[test]
fn test_payload_bytes() {
    let entry = sample_entry();
    assert_eq!(entry.payload_bytes(), "alpha1beta".len());
}

#[test]
fn test_empty_key_and_value_survive() {
    let entry = WalEntry::new(1, vec![(Vec::new(), Vec::new())]);
    let frame = entry.serialize().unwrap();

    let decoded = WalEntry::deserialize(&frame[HEADER_SIZE..]).unwrap();
    assert_eq!(decoded.writes, vec![(Vec::new(), Vec::new())]);
}
