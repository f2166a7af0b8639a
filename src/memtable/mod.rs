//! MemTable Module
//!
//! Committed blocks that have not been flushed to a table yet.
//!
//! A commit applies its whole batch under one write lock, so a reader
//! holding the read lock sees either all of a block or none of it. Keys are
//! kept ordered in a `BTreeMap` because a flush writes them out sorted.
//!
//! Staged writes of an open transaction never land here before commit.

mod table;

pub use table::MemTable;
