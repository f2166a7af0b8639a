//! Application state machine
//!
//! Maps the protocol calls onto validator, accumulator and query handler.
//! Only BeginBlock, DeliverTx, EndBlock and Commit touch the accumulator;
//! CheckTx and Query run beside them without taking its lock.

use parking_lot::Mutex;

use crate::engine::Engine;
use crate::error::{BlockKvError, Result};
use crate::protocol::{
    Application, RequestBeginBlock, RequestCheckTx, RequestDeliverTx, RequestEndBlock,
    RequestQuery, ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx,
    ResponseEndBlock, ResponseQuery, CODE_INVALID_TX, CODE_OK,
};

use super::validator::{is_valid, split_tx};
use super::{BlockAccumulator, QueryHandler};

const LOG_INVALID_TX: &str = "invalid tx: expected exactly one '=' separating key and value";

/// The key-value store application
pub struct KvStoreApp {
    /// Block-in-progress; locked only by the consensus connection
    block: Mutex<BlockAccumulator>,
    queries: QueryHandler,
}

impl KvStoreApp {
    pub fn new(engine: Engine) -> Self {
        Self {
            block: Mutex::new(BlockAccumulator::new(engine.clone())),
            queries: QueryHandler::new(engine),
        }
    }

    /// Whether a block is between BeginBlock and Commit
    pub fn block_open(&self) -> bool {
        self.block.lock().is_open()
    }

    /// Stop executing blocks (shutdown path)
    ///
    /// Drops the open block, if any, and makes every later block call fail
    /// with `ShuttingDown`. Runs under the block lock, so no block call can
    /// slip in between. Returns the number of staged writes thrown away.
    pub fn close(&self) -> usize {
        self.block.lock().close()
    }
}

impl Application for KvStoreApp {
    fn check_tx(&self, request: RequestCheckTx) -> Result<ResponseCheckTx> {
        if is_valid(&request.tx) {
            Ok(ResponseCheckTx {
                code: CODE_OK,
                log: String::new(),
            })
        } else {
            Ok(ResponseCheckTx {
                code: CODE_INVALID_TX,
                log: LOG_INVALID_TX.to_string(),
            })
        }
    }

    fn begin_block(&self, request: RequestBeginBlock) -> Result<ResponseBeginBlock> {
        self.block.lock().open()?;
        tracing::debug!(height = request.height, "begin block");
        Ok(ResponseBeginBlock::default())
    }

    fn deliver_tx(&self, request: RequestDeliverTx) -> Result<ResponseDeliverTx> {
        let Some((key, value)) = split_tx(&request.tx) else {
            tracing::trace!(len = request.tx.len(), "rejecting malformed tx");
            return Ok(ResponseDeliverTx {
                code: CODE_INVALID_TX,
                log: LOG_INVALID_TX.to_string(),
            });
        };

        self.block.lock().buffer_write(key, value)?;

        Ok(ResponseDeliverTx {
            code: CODE_OK,
            log: String::new(),
        })
    }

    fn end_block(&self, request: RequestEndBlock) -> Result<ResponseEndBlock> {
        let block = self.block.lock();
        block.ensure_running()?;
        if !block.is_open() {
            return Err(BlockKvError::NoOpenBlock("EndBlock"));
        }
        tracing::debug!(
            height = request.height,
            pending = block.pending_writes(),
            "end block"
        );
        Ok(ResponseEndBlock::default())
    }

    fn commit(&self) -> Result<ResponseCommit> {
        let info = self.block.lock().commit()?;
        tracing::info!(
            writes = info.writes,
            lsn = ?info.lsn,
            flushed = info.flushed,
            "committed block"
        );

        // No state root is computed: the commit marker is empty
        Ok(ResponseCommit::default())
    }

    fn query(&self, request: RequestQuery) -> Result<ResponseQuery> {
        let result = self.queries.get(&request.data)?;
        Ok(ResponseQuery {
            code: CODE_OK,
            log: result.log().to_string(),
            key: request.data,
            value: result.value,
            height: 0,
        })
    }
}
