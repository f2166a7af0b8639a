//! Error types for blockkv
//!
//! A malformed transaction is not an error here: it is answered with a
//! nonzero response code. Any `BlockKvError` that reaches the connection
//! layer from the application stops the node.

use thiserror::Error;

/// Result type alias using BlockKvError
pub type Result<T> = std::result::Result<T, BlockKvError>;

#[derive(Debug, Error)]
pub enum BlockKvError {
    // -------------------------------------------------------------------------
    // Block Lifecycle
    // -------------------------------------------------------------------------
    #[error("BeginBlock received while a block is already open")]
    BlockAlreadyOpen,

    #[error("{0} received with no open block")]
    NoOpenBlock(&'static str),

    #[error("a write transaction is already open")]
    WriterBusy,

    #[error("block too large: {size} bytes staged, limit is {limit}")]
    TxnTooBig { size: usize, limit: usize },

    /// Block call after shutdown began; ends the connection, not the node
    #[error("node is shutting down")]
    ShuttingDown,

    // -------------------------------------------------------------------------
    // Durability
    // -------------------------------------------------------------------------
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt WAL: {0}")]
    WalCorruption(String),

    #[error("WAL append failed: {0}")]
    WalWrite(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("encoding error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------
    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Startup
    // -------------------------------------------------------------------------
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<bincode::Error> for BlockKvError {
    fn from(err: bincode::Error) -> Self {
        BlockKvError::Serialization(err.to_string())
    }
}
