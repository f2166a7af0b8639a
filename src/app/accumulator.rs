//! Block accumulator
//!
//! Owns the write transaction of the block being executed. The slot is
//! filled by `open` and emptied by `commit` (or `discard`). After `close`
//! every block call fails with `ShuttingDown`.

use crate::engine::{CommitInfo, Engine, WriteTxn};
use crate::error::{BlockKvError, Result};

pub struct BlockAccumulator {
    engine: Engine,
    current: Option<WriteTxn>,
    closed: bool,
}

impl BlockAccumulator {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            current: None,
            closed: false,
        }
    }

    /// Start a block
    ///
    /// Opening while a block is already open is a call-sequence violation.
    pub fn open(&mut self) -> Result<()> {
        self.ensure_running()?;
        if self.current.is_some() {
            return Err(BlockKvError::BlockAlreadyOpen);
        }
        self.current = Some(self.engine.begin_write()?);
        Ok(())
    }

    /// Stage one write in the open block
    pub fn buffer_write(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_running()?;
        self.current
            .as_mut()
            .ok_or(BlockKvError::NoOpenBlock("DeliverTx"))?
            .set(key, value)
    }

    /// Persist every staged write of the block at once and close it
    pub fn commit(&mut self) -> Result<CommitInfo> {
        self.ensure_running()?;
        let txn = self
            .current
            .take()
            .ok_or(BlockKvError::NoOpenBlock("Commit"))?;
        txn.commit()
    }

    /// Close the block without persisting anything
    ///
    /// Returns the number of writes thrown away; 0 if no block was open.
    pub fn discard(&mut self) -> usize {
        match self.current.take() {
            Some(txn) => {
                let dropped = txn.len();
                txn.discard();
                dropped
            }
            None => 0,
        }
    }

    /// Discard the open block and refuse every later one
    ///
    /// Returns the number of writes thrown away.
    pub fn close(&mut self) -> usize {
        self.closed = true;
        self.discard()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// `ShuttingDown` once `close` has been called
    pub fn ensure_running(&self) -> Result<()> {
        if self.closed {
            return Err(BlockKvError::ShuttingDown);
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Distinct keys staged in the open block
    pub fn pending_writes(&self) -> usize {
        self.current.as_ref().map(WriteTxn::len).unwrap_or(0)
    }
}
