//! Wire format for LED request and response payloads.
//!
//! Requests are exactly [`REQUEST_LEN`] bytes:
//!
//! ```text
//! [operation:1][led target:1][period ms:2 BE][sequence number:2 BE]
//! ```
//!
//! Responses are exactly [`RESPONSE_LEN`] bytes:
//!
//! ```text
//! [result code:1][sequence number:2 BE]
//! ```
//!
//! Result code 2 means success; every other value means failure. This
//! binary mapping is a fixed contract of the remote service, not
//! configurable.

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::LedCommand;
use crate::error::{Error, Result};

/// Request payload length in bytes.
pub const REQUEST_LEN: usize = 6;

/// Response payload length in bytes.
pub const RESPONSE_LEN: usize = 3;

/// Result code the service sends for a successfully executed request.
pub const RESULT_OK: u8 = 2;

/// Encode a command and its sequence number into a request payload.
///
/// The period bytes are zero unless the operation carries one.
pub fn encode_request(command: &LedCommand, seq: u16) -> Bytes {
    let mut buf = BytesMut::with_capacity(REQUEST_LEN);
    buf.put_u8(command.operation.tag());
    buf.put_u8(command.target.value());
    buf.put_u16(command.operation.period_ms());
    buf.put_u16(seq);
    buf.freeze()
}

/// A decoded response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Raw result code.
    pub result: u8,
    /// Sequence number echoed by the service, for display purposes.
    pub seq: u16,
}

impl ResponseFrame {
    /// Whether the service reported success.
    pub fn is_success(&self) -> bool {
        self.result == RESULT_OK
    }
}

/// Parse a response payload.
///
/// Fails with [`Error::MalformedResponse`] unless the payload is exactly
/// [`RESPONSE_LEN`] bytes.
pub fn parse_response(payload: &[u8]) -> Result<ResponseFrame> {
    match payload {
        [result, hi, lo] => Ok(ResponseFrame {
            result: *result,
            seq: u16::from_be_bytes([*hi, *lo]),
        }),
        _ => Err(Error::MalformedResponse { len: payload.len() }),
    }
}
