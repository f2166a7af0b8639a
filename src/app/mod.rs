//! App Module
//!
//! The key-value application the consensus engine drives.
//!
//! ## Components
//! - `validator`: is a raw transaction `key=value`?
//! - `BlockAccumulator`: owns the write transaction of the open block
//! - `QueryHandler`: point reads against committed state only
//! - `KvStoreApp`: sequences protocol calls onto the three above
//!
//! ## Block Lifecycle
//! ```text
//!            BeginBlock            DeliverTx*        Commit
//!   Idle ─────────────▶ BlockOpen ───────────▶ ... ─────────▶ Idle
//! ```
//! CheckTx and Query are valid in any state and never touch the open block.

pub mod validator;

mod accumulator;
mod query;
mod state_machine;

pub use accumulator::BlockAccumulator;
pub use query::{QueryHandler, QueryResult, LOG_EXISTS, LOG_NOT_FOUND};
pub use state_machine::KvStoreApp;
pub use validator::{is_valid, split_tx, SEPARATOR};
