//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Type (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! Len is big-endian. The payload is the bincode encoding of the whole
//! `Request`/`Response`; the decoder checks it agrees with the type byte.

use std::io::{Read, Write};

use bincode::Options;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BlockKvError, Result};

use super::{MessageType, Request, Response};

/// Header size: 1 byte type + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(u64::from(MAX_PAYLOAD_SIZE))
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to a frame
pub fn encode_request(request: &Request) -> Result<Bytes> {
    encode_frame(request.message_type(), request)
}

/// Decode a request from a complete frame
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (kind, payload) = split_frame(bytes)?;
    if kind == MessageType::Exception {
        return Err(BlockKvError::Protocol(
            "Exception is not a valid request type".to_string(),
        ));
    }

    let request: Request = decode_payload(payload)?;
    check_type(kind, request.message_type())?;
    Ok(request)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to a frame
pub fn encode_response(response: &Response) -> Result<Bytes> {
    encode_frame(response.message_type(), response)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (kind, payload) = split_frame(bytes)?;
    let response: Response = decode_payload(payload)?;
    check_type(kind, response.message_type())?;
    Ok(response)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let frame = read_frame(reader)?;
    decode_request(&frame)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader)?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Framing
// =============================================================================

fn encode_frame<T: Serialize>(kind: MessageType, body: &T) -> Result<Bytes> {
    let payload = wire_options().serialize(body)?;
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(BlockKvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    frame.put_u8(kind as u8);
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Validate the header and return the type and exact payload
fn split_frame(bytes: &[u8]) -> Result<(MessageType, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(BlockKvError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let type_byte = header.get_u8();
    let payload_len = header.get_u32() as usize;

    let kind = MessageType::try_from(type_byte).map_err(|b| {
        BlockKvError::Protocol(format!("Unknown message type: 0x{:02x}", b))
    })?;

    check_payload_len(payload_len)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() != total_len {
        return Err(BlockKvError::Protocol(format!(
            "Frame length mismatch: header says {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..]))
}

fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    wire_options()
        .deserialize(payload)
        .map_err(|e| BlockKvError::Protocol(format!("Malformed payload: {}", e)))
}

fn check_type(header: MessageType, decoded: MessageType) -> Result<()> {
    if header != decoded {
        return Err(BlockKvError::Protocol(format!(
            "Type byte {:?} does not match payload {:?}",
            header, decoded
        )));
    }
    Ok(())
}

fn check_payload_len(len: usize) -> Result<()> {
    if len > MAX_PAYLOAD_SIZE as usize {
        return Err(BlockKvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// Read header + payload of one frame
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    check_payload_len(payload_len)?;

    let mut frame = vec![0u8; HEADER_SIZE + payload_len];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut frame[HEADER_SIZE..])?;
    Ok(frame)
}
