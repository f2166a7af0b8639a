//! Transaction format
//!
//! A transaction is `key=value`: exactly one `=` byte. Validation and
//! execution both go through [`split_tx`] so they can never disagree.

/// Separator between key and value
pub const SEPARATOR: u8 = b'=';

/// Split a transaction into `(key, value)`
///
/// Returns `None` unless an unbounded split on `=` yields exactly two parts.
/// `"=v"`, `"k="` and `"="` are well-formed (empty key and/or value);
/// `"k"` and `"k=v=w"` are not.
pub fn split_tx(tx: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut parts = tx.split(|b| *b == SEPARATOR);
    let key = parts.next()?;
    let value = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((key, value))
}

/// Whether a transaction is well-formed
pub fn is_valid(tx: &[u8]) -> bool {
    split_tx(tx).is_some()
}
