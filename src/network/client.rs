//! Client
//!
//! Blocking client for the application socket, used by the CLI and tests.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{BlockKvError, Result};
use crate::protocol::{
    read_response, write_request, CheckTxKind, Request, RequestBeginBlock, RequestCheckTx,
    RequestDeliverTx, RequestEndBlock, RequestInfo, RequestQuery, Response, ResponseCheckTx,
    ResponseCommit, ResponseDeliverTx, ResponseInfo, ResponseQuery,
};

/// One connection to a blockkv node
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// Unwrap the expected response variant or fail with a protocol error
macro_rules! expect_response {
    ($response:expr, $variant:ident) => {
        match $response {
            Response::$variant(inner) => Ok(inner),
            Response::Exception { error } => Err(BlockKvError::Protocol(error)),
            other => Err(BlockKvError::Protocol(format!(
                "unexpected response {:?}",
                other.message_type()
            ))),
        }
    };
}

impl Client {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| BlockKvError::Network(format!("connect: {}", e)))?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send any request and wait for its response
    pub fn request(&mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;
        read_response(&mut self.reader)
    }

    pub fn echo(&mut self, message: &str) -> Result<String> {
        let response = self.request(&Request::Echo {
            message: message.to_string(),
        })?;
        match response {
            Response::Echo { message } => Ok(message),
            Response::Exception { error } => Err(BlockKvError::Protocol(error)),
            other => Err(BlockKvError::Protocol(format!(
                "unexpected response {:?}",
                other.message_type()
            ))),
        }
    }

    pub fn info(&mut self) -> Result<ResponseInfo> {
        let response = self.request(&Request::Info(RequestInfo {
            version: crate::VERSION.to_string(),
            ..Default::default()
        }))?;
        expect_response!(response, Info)
    }

    pub fn check_tx(&mut self, tx: &[u8]) -> Result<ResponseCheckTx> {
        let response = self.request(&Request::CheckTx(RequestCheckTx {
            tx: tx.to_vec(),
            kind: CheckTxKind::New,
        }))?;
        expect_response!(response, CheckTx)
    }

    pub fn begin_block(&mut self, height: u64) -> Result<()> {
        let response = self.request(&Request::BeginBlock(RequestBeginBlock {
            height,
            ..Default::default()
        }))?;
        expect_response!(response, BeginBlock).map(|_| ())
    }

    pub fn deliver_tx(&mut self, tx: &[u8]) -> Result<ResponseDeliverTx> {
        let response = self.request(&Request::DeliverTx(RequestDeliverTx { tx: tx.to_vec() }))?;
        expect_response!(response, DeliverTx)
    }

    pub fn end_block(&mut self, height: u64) -> Result<()> {
        let response = self.request(&Request::EndBlock(RequestEndBlock { height }))?;
        expect_response!(response, EndBlock).map(|_| ())
    }

    pub fn commit(&mut self) -> Result<ResponseCommit> {
        let response = self.request(&Request::Commit)?;
        expect_response!(response, Commit)
    }

    pub fn query(&mut self, key: &[u8]) -> Result<ResponseQuery> {
        let response = self.request(&Request::Query(RequestQuery {
            data: key.to_vec(),
            ..Default::default()
        }))?;
        expect_response!(response, Query)
    }
}
