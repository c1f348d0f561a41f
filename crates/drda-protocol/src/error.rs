//! Protocol error types.

use thiserror::Error;

/// Errors raised while framing, building or parsing DRDA structures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Not enough bytes to decode a fixed-size structure.
    #[error("incomplete data: expected {expected} bytes, got {actual}")]
    Incomplete {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// DSS header did not carry the `0xD0` magic byte.
    #[error("invalid DSS magic byte: 0x{0:02X}")]
    InvalidMagic(u8),

    /// DSS header carried an unknown DSS type nibble.
    #[error("invalid DSS type: {0}")]
    InvalidDssType(u8),

    /// DSS length field is smaller than the header itself.
    #[error("invalid DSS length: {0}")]
    InvalidLength(usize),

    /// An embedded object declares more bytes than its container holds.
    #[error("object 0x{code_point:04X} declares {declared} bytes but only {available} remain")]
    ObjectOverrun {
        /// Code point of the offending object.
        code_point: u16,
        /// Declared content length.
        declared: usize,
        /// Bytes left in the container.
        available: usize,
    },

    /// An embedded object length is below the minimum LL/CP size.
    #[error("invalid object length {length} for code point 0x{code_point:04X}")]
    InvalidObjectLength {
        /// Code point of the offending object.
        code_point: u16,
        /// Declared length.
        length: usize,
    },

    /// A structure inside a reply object was malformed.
    #[error("malformed {object}: {reason}")]
    Malformed {
        /// Name of the structure being decoded.
        object: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// A string could not be represented in the negotiated encoding.
    #[error("cannot encode {value:?} as {encoding}")]
    Encoding {
        /// The offending text.
        value: String,
        /// Name of the target encoding.
        encoding: &'static str,
    },
}

impl ProtocolError {
    /// Build a [`ProtocolError::Malformed`].
    pub fn malformed(object: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            object,
            reason: reason.into(),
        }
    }
}
