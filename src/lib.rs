//! # blockkv
//!
//! A key-value application driven by a BFT consensus engine:
//! - `key=value` transactions, validated identically on admission and execution
//! - Each block's writes committed atomically through a Write-Ahead Log
//! - Queries served from committed state only, concurrently with execution
//! - Socket protocol for the engine's consensus, mempool and query connections
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Consensus Engine (external)                   │
//! │        consensus / mempool / query connections               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  TCP (protocol frames)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  KvStoreApp (state machine)                  │
//! │   CheckTx ─ validator     BeginBlock..Commit ─ accumulator   │
//! │   Query ─ query handler                                      │
//! └──────────┬───────────────────────────────┬──────────────────┘
//!            │ WriteTxn (one at a time)      │ ReadView (many)
//! ┌──────────▼───────────────────────────────▼──────────────────┐
//! │                          Engine                              │
//! │     ┌─────────────┐   ┌─────────────┐   ┌─────────────┐     │
//! │     │     WAL     │   │  MemTable   │   │   Tables    │     │
//! │     │ (1 frame /  │──▶│  (RwLock)   │──▶│   (flush)   │     │
//! │     │   block)    │   └─────────────┘   └─────────────┘     │
//! │     └─────────────┘                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;

pub mod protocol;
pub mod app;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BlockKvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use app::KvStoreApp;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blockkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
