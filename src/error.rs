//! # Error Types
//!
//! This module defines all error types used throughout the crate.
//!
//! | Variant | Cause | Recoverable? |
//! |---------|-------|--------------|
//! | [`Error::Io`] | Transport send failure | Maybe (retried next cycle) |
//! | [`Error::MalformedResponse`] | Response payload length ≠ 3 | Yes (event is dropped) |
//! | [`Error::Shutdown`] | Client has shut down | No (restart client) |
//!
//! Invalid interactive input is not an `Error`: the command builder
//! re-prompts and the build continues (see [`crate::command`]).

use std::fmt;
use std::io;

/// Result type alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all client operations.
#[derive(Debug)]
pub enum Error {
    /// Transport I/O error.
    ///
    /// Raised by the concrete [`Transport`](crate::transport::Transport)
    /// implementation. The dispatcher logs it and keeps the request armed
    /// for the next cycle.
    Io(io::Error),

    /// A response payload had the wrong length.
    ///
    /// The wire contract fixes responses at exactly 3 bytes. The offending
    /// event is reported and dropped; no new request is armed for it.
    MalformedResponse {
        /// Actual payload length in bytes.
        len: usize,
    },

    /// The client has shut down.
    ///
    /// Returned by [`EventSender`](crate::client::EventSender) once the
    /// client's tasks have exited and the event channel is closed.
    Shutdown,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MalformedResponse { len } => write!(
                f,
                "Response payload size is incorrect. Expected 3 bytes, got {len} bytes."
            ),
            Self::Shutdown => write!(f, "Client has shut down"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
