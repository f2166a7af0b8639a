//! Protocol Module
//!
//! The application interface the consensus engine drives, and its wire form.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Type (1) │ Len (4)  │   Payload (bincode)         │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! Requests and responses share the type byte; `0x00` is used only by the
//! `Exception` response.
//!
//! ### Call Sequence
//! - Mempool connection: `CheckTx*`
//! - Consensus connection: `BeginBlock → DeliverTx* → EndBlock → Commit`
//! - Query connection: `Info`, `Query*`

mod application;
mod codec;
mod request;
mod response;

pub use application::{dispatch, Application};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use request::{
    CheckTxKind, Request, RequestApplySnapshotChunk, RequestBeginBlock, RequestCheckTx,
    RequestDeliverTx, RequestEndBlock, RequestInfo, RequestInitChain, RequestLoadSnapshotChunk,
    RequestOfferSnapshot, RequestPrepareProposal, RequestProcessProposal, RequestQuery, Snapshot,
};
pub use response::{
    ApplySnapshotChunkResult, OfferSnapshotResult, ProposalStatus, Response,
    ResponseApplySnapshotChunk, ResponseBeginBlock, ResponseCheckTx, ResponseCommit,
    ResponseDeliverTx, ResponseEndBlock, ResponseInfo, ResponseInitChain,
    ResponseListSnapshots, ResponseLoadSnapshotChunk, ResponseOfferSnapshot,
    ResponsePrepareProposal, ResponseProcessProposal, ResponseQuery, CODE_INVALID_TX, CODE_OK,
};

/// Message types (frame type byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Exception = 0x00,
    Echo = 0x01,
    Flush = 0x02,
    Info = 0x03,
    InitChain = 0x04,
    CheckTx = 0x05,
    BeginBlock = 0x06,
    DeliverTx = 0x07,
    EndBlock = 0x08,
    Commit = 0x09,
    Query = 0x0a,
    PrepareProposal = 0x0b,
    ProcessProposal = 0x0c,
    ListSnapshots = 0x0d,
    OfferSnapshot = 0x0e,
    LoadSnapshotChunk = 0x0f,
    ApplySnapshotChunk = 0x10,
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(byte: u8) -> std::result::Result<Self, u8> {
        Ok(match byte {
            0x00 => MessageType::Exception,
            0x01 => MessageType::Echo,
            0x02 => MessageType::Flush,
            0x03 => MessageType::Info,
            0x04 => MessageType::InitChain,
            0x05 => MessageType::CheckTx,
            0x06 => MessageType::BeginBlock,
            0x07 => MessageType::DeliverTx,
            0x08 => MessageType::EndBlock,
            0x09 => MessageType::Commit,
            0x0a => MessageType::Query,
            0x0b => MessageType::PrepareProposal,
            0x0c => MessageType::ProcessProposal,
            0x0d => MessageType::ListSnapshots,
            0x0e => MessageType::OfferSnapshot,
            0x0f => MessageType::LoadSnapshotChunk,
            0x10 => MessageType::ApplySnapshotChunk,
            other => return Err(other),
        })
    }
}
