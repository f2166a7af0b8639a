//! Transaction format tests
//!
//! Fixed cases plus properties over arbitrary byte strings.

use blockkv::app::{is_valid, split_tx, SEPARATOR};
use proptest::prelude::*;

// =============================================================================
// Fixed Cases
// =============================================================================

#[test]
fn test_key_value_is_valid() {
    assert_eq!(split_tx(b"name=satoshi"), Some((&b"name"[..], &b"satoshi"[..])));
    assert!(is_valid(b"name=satoshi"));
}

#[test]
fn test_empty_key_or_value_is_valid() {
    assert_eq!(split_tx(b"=v"), Some((&b""[..], &b"v"[..])));
    assert_eq!(split_tx(b"k="), Some((&b"k"[..], &b""[..])));
    assert_eq!(split_tx(b"="), Some((&b""[..], &b""[..])));
}

#[test]
fn test_missing_separator_is_invalid() {
    assert!(!is_valid(b"y"));
    assert!(!is_valid(b""));
}

#[test]
fn test_two_separators_is_invalid() {
    assert!(!is_valid(b"k=v=w"));
    assert!(!is_valid(b"=="));
    assert_eq!(split_tx(b"a=b="), None);
}

#[test]
fn test_binary_bytes_allowed() {
    assert!(is_valid(&[0, 255, SEPARATOR, 7, 0]));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_valid_iff_exactly_one_separator(tx in proptest::collection::vec(any::<u8>(), 0..64)) {
        let separators = tx.iter().filter(|b| **b == SEPARATOR).count();
        prop_assert_eq!(is_valid(&tx), separators == 1);
    }

    #[test]
    fn prop_validation_is_deterministic(tx in proptest::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(is_valid(&tx), is_valid(&tx));
        prop_assert_eq!(split_tx(&tx), split_tx(&tx));
    }

    #[test]
    fn prop_split_rejoins_to_input(
        key in proptest::collection::vec(any::<u8>().prop_filter("no separator", |b| *b != SEPARATOR), 0..32),
        value in proptest::collection::vec(any::<u8>().prop_filter("no separator", |b| *b != SEPARATOR), 0..32),
    ) {
        let mut tx = key.clone();
        tx.push(SEPARATOR);
        tx.extend_from_slice(&value);

        let (k, v) = split_tx(&tx).unwrap();
        prop_assert_eq!(k, key.as_slice());
        prop_assert_eq!(v, value.as_slice());
    }
}
