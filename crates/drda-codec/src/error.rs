//! Codec error types.

use std::io;

use drda_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised while reading or writing DSS units.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the stream before a new unit started.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The stream ended in the middle of a unit.
    #[error("stream ended mid-unit: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required to complete the current field.
        expected: usize,
        /// Bytes received before the stream ended.
        actual: usize,
    },

    /// A unit header or object was malformed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl CodecError {
    /// Whether this is a transport failure (the stream itself broke).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }

    /// Whether this is a framing failure (the bytes were inconsistent).
    #[must_use]
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Truncated { .. } | Self::Protocol(_))
    }
}
