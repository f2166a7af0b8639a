//! Application trait
//!
//! One method per call of the application interface. Every method has a
//! default, so an application only overrides the calls it cares about.
//!
//! Methods take `&self`: the engine calls CheckTx and Query on their own
//! connections while a block is executing on the consensus connection.
//!
//! `Err` is reserved for faults the node cannot recover from locally (a
//! storage error, a broken call sequence). An invalid transaction is an `Ok`
//! response with a nonzero code.

use crate::error::Result;

use super::{
    ProposalStatus, Request, RequestApplySnapshotChunk, RequestBeginBlock, RequestCheckTx,
    RequestDeliverTx, RequestEndBlock, RequestInfo, RequestInitChain, RequestLoadSnapshotChunk,
    RequestOfferSnapshot, RequestPrepareProposal, RequestProcessProposal, RequestQuery, Response,
    ResponseApplySnapshotChunk, ResponseBeginBlock, ResponseCheckTx, ResponseCommit,
    ResponseDeliverTx, ResponseEndBlock, ResponseInfo, ResponseInitChain, ResponseListSnapshots,
    ResponseLoadSnapshotChunk, ResponseOfferSnapshot, ResponsePrepareProposal,
    ResponseProcessProposal, ResponseQuery,
};

pub trait Application: Send + Sync {
    // -------------------------------------------------------------------------
    // Info / query connection
    // -------------------------------------------------------------------------
    fn info(&self, _request: RequestInfo) -> Result<ResponseInfo> {
        Ok(ResponseInfo::default())
    }

    fn query(&self, _request: RequestQuery) -> Result<ResponseQuery> {
        Ok(ResponseQuery::default())
    }

    // -------------------------------------------------------------------------
    // Mempool connection
    // -------------------------------------------------------------------------
    fn check_tx(&self, _request: RequestCheckTx) -> Result<ResponseCheckTx> {
        Ok(ResponseCheckTx::default())
    }

    // -------------------------------------------------------------------------
    // Consensus connection
    // -------------------------------------------------------------------------
    fn init_chain(&self, _request: RequestInitChain) -> Result<ResponseInitChain> {
        Ok(ResponseInitChain::default())
    }

    /// Default: propose the transactions exactly as given
    fn prepare_proposal(&self, request: RequestPrepareProposal) -> Result<ResponsePrepareProposal> {
        Ok(ResponsePrepareProposal { txs: request.txs })
    }

    /// Default: accept every proposal
    fn process_proposal(&self, _request: RequestProcessProposal) -> Result<ResponseProcessProposal> {
        Ok(ResponseProcessProposal {
            status: ProposalStatus::Accept,
        })
    }

    fn begin_block(&self, _request: RequestBeginBlock) -> Result<ResponseBeginBlock> {
        Ok(ResponseBeginBlock::default())
    }

    fn deliver_tx(&self, _request: RequestDeliverTx) -> Result<ResponseDeliverTx> {
        Ok(ResponseDeliverTx::default())
    }

    fn end_block(&self, _request: RequestEndBlock) -> Result<ResponseEndBlock> {
        Ok(ResponseEndBlock::default())
    }

    fn commit(&self) -> Result<ResponseCommit> {
        Ok(ResponseCommit::default())
    }

    // -------------------------------------------------------------------------
    // Snapshot connection (state sync)
    // -------------------------------------------------------------------------
    fn list_snapshots(&self) -> Result<ResponseListSnapshots> {
        Ok(ResponseListSnapshots::default())
    }

    fn offer_snapshot(&self, _request: RequestOfferSnapshot) -> Result<ResponseOfferSnapshot> {
        Ok(ResponseOfferSnapshot::default())
    }

    fn load_snapshot_chunk(
        &self,
        _request: RequestLoadSnapshotChunk,
    ) -> Result<ResponseLoadSnapshotChunk> {
        Ok(ResponseLoadSnapshotChunk::default())
    }

    fn apply_snapshot_chunk(
        &self,
        _request: RequestApplySnapshotChunk,
    ) -> Result<ResponseApplySnapshotChunk> {
        Ok(ResponseApplySnapshotChunk::default())
    }
}

/// Route a request to the matching application call
///
/// Echo and Flush are transport messages and never reach the application.
pub fn dispatch<A: Application + ?Sized>(app: &A, request: Request) -> Result<Response> {
    Ok(match request {
        Request::Echo { message } => Response::Echo { message },
        Request::Flush => Response::Flush,
        Request::Info(req) => Response::Info(app.info(req)?),
        Request::InitChain(req) => Response::InitChain(app.init_chain(req)?),
        Request::CheckTx(req) => Response::CheckTx(app.check_tx(req)?),
        Request::BeginBlock(req) => Response::BeginBlock(app.begin_block(req)?),
        Request::DeliverTx(req) => Response::DeliverTx(app.deliver_tx(req)?),
        Request::EndBlock(req) => Response::EndBlock(app.end_block(req)?),
        Request::Commit => Response::Commit(app.commit()?),
        Request::Query(req) => Response::Query(app.query(req)?),
        Request::PrepareProposal(req) => Response::PrepareProposal(app.prepare_proposal(req)?),
        Request::ProcessProposal(req) => Response::ProcessProposal(app.process_proposal(req)?),
        Request::ListSnapshots => Response::ListSnapshots(app.list_snapshots()?),
        Request::OfferSnapshot(req) => Response::OfferSnapshot(app.offer_snapshot(req)?),
        Request::LoadSnapshotChunk(req) => {
            Response::LoadSnapshotChunk(app.load_snapshot_chunk(req)?)
        }
        Request::ApplySnapshotChunk(req) => {
            Response::ApplySnapshotChunk(app.apply_snapshot_chunk(req)?)
        }
    })
}
