//! Response definitions
//!
//! What the application answers to each call.

use serde::{Deserialize, Serialize};

use super::{MessageType, Snapshot};

/// Response code for success / valid transaction
pub const CODE_OK: u32 = 0;

/// Response code for a malformed transaction
pub const CODE_INVALID_TX: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub data: String,
    pub version: String,
    pub app_version: u64,
    pub last_block_height: u64,
    pub last_block_app_hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInitChain {
    pub app_hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCheckTx {
    pub code: u32,
    pub log: String,
}

impl ResponseCheckTx {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBeginBlock {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDeliverTx {
    pub code: u32,
    pub log: String,
}

impl ResponseDeliverTx {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEndBlock {}

/// `data` is the commit marker (an app hash in applications that compute one)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCommit {
    pub data: Vec<u8>,
    pub retain_height: u64,
}

/// `value` is `Some` exactly when the key exists; `log` carries the marker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseQuery {
    pub code: u32,
    pub log: String,
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
    pub height: u64,
}

impl ResponseQuery {
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePrepareProposal {
    pub txs: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[default]
    Unknown,
    Accept,
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseProcessProposal {
    pub status: ProposalStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseListSnapshots {
    pub snapshots: Vec<Snapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferSnapshotResult {
    #[default]
    Unknown,
    Accept,
    Abort,
    Reject,
    RejectFormat,
    RejectSender,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOfferSnapshot {
    pub result: OfferSnapshotResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseLoadSnapshotChunk {
    pub chunk: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplySnapshotChunkResult {
    #[default]
    Unknown,
    Accept,
    Abort,
    Retry,
    RetrySnapshot,
    RejectSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseApplySnapshotChunk {
    pub result: ApplySnapshotChunkResult,
    pub refetch_chunks: Vec<u32>,
    pub reject_senders: Vec<String>,
}

/// A response frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// The request could not be decoded or handled
    Exception { error: String },
    Echo { message: String },
    Flush,
    Info(ResponseInfo),
    InitChain(ResponseInitChain),
    CheckTx(ResponseCheckTx),
    BeginBlock(ResponseBeginBlock),
    DeliverTx(ResponseDeliverTx),
    EndBlock(ResponseEndBlock),
    Commit(ResponseCommit),
    Query(ResponseQuery),
    PrepareProposal(ResponsePrepareProposal),
    ProcessProposal(ResponseProcessProposal),
    ListSnapshots(ResponseListSnapshots),
    OfferSnapshot(ResponseOfferSnapshot),
    LoadSnapshotChunk(ResponseLoadSnapshotChunk),
    ApplySnapshotChunk(ResponseApplySnapshotChunk),
}

impl Response {
    /// Create an EXCEPTION response
    pub fn exception(message: &str) -> Self {
        Response::Exception {
            error: message.to_string(),
        }
    }

    /// Get the message type
    pub fn message_type(&self) -> MessageType {
        match self {
            Response::Exception { .. } => MessageType::Exception,
            Response::Echo { .. } => MessageType::Echo,
            Response::Flush => MessageType::Flush,
            Response::Info(_) => MessageType::Info,
            Response::InitChain(_) => MessageType::InitChain,
            Response::CheckTx(_) => MessageType::CheckTx,
            Response::BeginBlock(_) => MessageType::BeginBlock,
            Response::DeliverTx(_) => MessageType::DeliverTx,
            Response::EndBlock(_) => MessageType::EndBlock,
            Response::Commit(_) => MessageType::Commit,
            Response::Query(_) => MessageType::Query,
            Response::PrepareProposal(_) => MessageType::PrepareProposal,
            Response::ProcessProposal(_) => MessageType::ProcessProposal,
            Response::ListSnapshots(_) => MessageType::ListSnapshots,
            Response::OfferSnapshot(_) => MessageType::OfferSnapshot,
            Response::LoadSnapshotChunk(_) => MessageType::LoadSnapshotChunk,
            Response::ApplySnapshotChunk(_) => MessageType::ApplySnapshotChunk,
        }
    }
}
