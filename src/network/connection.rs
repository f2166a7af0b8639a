//! Per-connection request loop

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BlockKvError, Result};
use crate::protocol::{
    dispatch, read_request, write_response, Application, MessageType, Request, Response,
};

/// Exit status when the application reports an unrecoverable fault
pub const FATAL_EXIT_CODE: i32 = 1;

/// One socket from the consensus engine, served on its own thread
///
/// Requests are answered strictly in arrival order.
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    app: Arc<dyn Application>,
    peer_addr: String,
}

/// Whether the request loop keeps going
enum Step {
    Continue,
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, app: Arc<dyn Application>) -> Result<Self> {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => "unknown".to_string(),
        };

        // Responses are small and latency bound
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            app,
            peer_addr,
        })
    }

    /// 0 leaves that direction without a timeout
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Serve requests until the peer goes away
    ///
    /// An undecodable frame is answered with an exception and ends the
    /// connection with an error. A block call refused during shutdown ends
    /// the connection quietly. Any other application error stops the whole
    /// process.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Engine connected from {}", self.peer_addr);

        while let Step::Continue = self.step()? {}

        tracing::debug!("Engine connection {} closed", self.peer_addr);
        Ok(())
    }

    fn step(&mut self) -> Result<Step> {
        let request = match read_request(&mut self.reader) {
            Ok(request) => request,
            Err(BlockKvError::Io(e)) if is_disconnect(e.kind()) => return Ok(Step::Closed),
            Err(e) => {
                tracing::warn!("Undecodable request from {}: {}", self.peer_addr, e);
                let _ = write_response(&mut self.writer, &Response::exception(&e.to_string()));
                return Err(e);
            }
        };

        tracing::trace!("{:?} from {}", request.message_type(), self.peer_addr);
        let Some(response) = self.execute_request(request) else {
            return Ok(Step::Closed);
        };

        match write_response(&mut self.writer, &response) {
            Ok(()) => Ok(Step::Continue),
            Err(BlockKvError::Io(e)) if is_disconnect(e.kind()) => {
                tracing::debug!("{} went away before its response was sent", self.peer_addr);
                Ok(Step::Closed)
            }
            Err(e) => Err(e),
        }
    }

    /// Execute a request; fatal application errors halt the node
    ///
    /// `None` means the node is shutting down and the request was refused.
    fn execute_request(&self, request: Request) -> Option<Response> {
        let kind = request.message_type();
        match dispatch(self.app.as_ref(), request) {
            Ok(response) => Some(response),
            Err(BlockKvError::ShuttingDown) => {
                tracing::debug!("Refusing {:?} from {}: shutting down", kind, self.peer_addr);
                None
            }
            Err(e) => halt(kind, &e),
        }
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Log and terminate the process; no retry after a storage fault
fn halt(kind: MessageType, err: &BlockKvError) -> ! {
    tracing::error!("Fatal error handling {:?}: {}; halting node", kind, err);
    std::process::exit(FATAL_EXIT_CODE)
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
