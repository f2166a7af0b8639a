//! Request definitions
//!
//! Calls the consensus engine makes into the application.

use serde::{Deserialize, Serialize};

use super::MessageType;

/// Whether a CheckTx is a first admission or a mempool re-check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckTxKind {
    #[default]
    New,
    Recheck,
}

/// Handshake: the engine asks what state the application is in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub version: String,
    pub block_version: u64,
    pub p2p_version: u64,
}

/// Genesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInitChain {
    pub chain_id: String,
    pub initial_height: u64,
    pub app_state_bytes: Vec<u8>,
}

/// Mempool admission check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCheckTx {
    pub tx: Vec<u8>,
    pub kind: CheckTxKind,
}

/// Opens a block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBeginBlock {
    pub hash: Vec<u8>,
    pub height: u64,
}

/// Executes one transaction of the open block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDeliverTx {
    pub tx: Vec<u8>,
}

/// Closes block execution (before Commit)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEndBlock {
    pub height: u64,
}

/// Point read against committed state; `data` is the key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestQuery {
    pub data: Vec<u8>,
    pub path: String,
    pub height: u64,
    pub prove: bool,
}

/// The proposer may reshape the transaction list of its block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPrepareProposal {
    pub txs: Vec<Vec<u8>>,
    pub height: u64,
}

/// A validator decides whether to vote for a proposed block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestProcessProposal {
    pub txs: Vec<Vec<u8>>,
    pub hash: Vec<u8>,
    pub height: u64,
}

/// State-sync snapshot descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub height: u64,
    pub format: u32,
    pub chunks: u32,
    pub hash: Vec<u8>,
    pub metadata: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOfferSnapshot {
    pub snapshot: Option<Snapshot>,
    pub app_hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLoadSnapshotChunk {
    pub height: u64,
    pub format: u32,
    pub chunk: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestApplySnapshotChunk {
    pub index: u32,
    pub chunk: Vec<u8>,
    pub sender: String,
}

/// A request frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Transport liveness check, answered without touching the application
    Echo { message: String },
    /// Transport flush, answered without touching the application
    Flush,
    Info(RequestInfo),
    InitChain(RequestInitChain),
    CheckTx(RequestCheckTx),
    BeginBlock(RequestBeginBlock),
    DeliverTx(RequestDeliverTx),
    EndBlock(RequestEndBlock),
    Commit,
    Query(RequestQuery),
    PrepareProposal(RequestPrepareProposal),
    ProcessProposal(RequestProcessProposal),
    ListSnapshots,
    OfferSnapshot(RequestOfferSnapshot),
    LoadSnapshotChunk(RequestLoadSnapshotChunk),
    ApplySnapshotChunk(RequestApplySnapshotChunk),
}

impl Request {
    /// Get the message type
    pub fn message_type(&self) -> MessageType {
        match self {
            Request::Echo { .. } => MessageType::Echo,
            Request::Flush => MessageType::Flush,
            Request::Info(_) => MessageType::Info,
            Request::InitChain(_) => MessageType::InitChain,
            Request::CheckTx(_) => MessageType::CheckTx,
            Request::BeginBlock(_) => MessageType::BeginBlock,
            Request::DeliverTx(_) => MessageType::DeliverTx,
            Request::EndBlock(_) => MessageType::EndBlock,
            Request::Commit => MessageType::Commit,
            Request::Query(_) => MessageType::Query,
            Request::PrepareProposal(_) => MessageType::PrepareProposal,
            Request::ProcessProposal(_) => MessageType::ProcessProposal,
            Request::ListSnapshots => MessageType::ListSnapshots,
            Request::OfferSnapshot(_) => MessageType::OfferSnapshot,
            Request::LoadSnapshotChunk(_) => MessageType::LoadSnapshotChunk,
            Request::ApplySnapshotChunk(_) => MessageType::ApplySnapshotChunk,
        }
    }
}
