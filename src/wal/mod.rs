//! Write-Ahead Log (WAL) Module
//!
//! Every committed block is appended here as a single frame before any
//! reader can see it. On startup the frames are replayed, so a block either
//! survives a crash whole or (if its frame is incomplete) not at all.
//!
//! ## Frame
//! ```text
//! ┌───────────┬───────────┬───────────┬──────────────────────────┐
//! │ LSN u64   │ CRC32 u32 │ Len u32   │ bincode(WalEntry)        │
//! └───────────┴───────────┴───────────┴──────────────────────────┘
//! ```
//! Header fields are little-endian; the CRC covers the data only.
//!
//! An incomplete last frame is a torn write and is cut off during recovery.
//! A complete frame with a bad CRC is corruption and stops recovery.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{WalEntry, HEADER_SIZE};
pub use reader::WalReader;
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
