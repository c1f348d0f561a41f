//! Client error types.

use drda_codec::CodecError;
use drda_protocol::{CodePoint, ProtocolError};
use drda_types::TypeError;
use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error on the transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Framing error while reading DSS units.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// Malformed reply object or unencodable request string.
    ///
    /// Raised after the reply chain has been read in full, or before the
    /// request is sent, so the conversation stays in step.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Value decoding or conversion error.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// The server reported an SQL error.
    #[error("SQL error {code} ({state}): {message}")]
    Sql {
        /// SQLCODE.
        code: i32,
        /// SQLSTATE.
        state: String,
        /// Server message text.
        message: String,
    },

    /// The server rejected a request with an error reply message.
    #[error("server rejected request with {code_point} (severity {severity}): {message}")]
    Server {
        /// Reply message code point.
        code_point: CodePoint,
        /// Severity code.
        severity: u16,
        /// Diagnostic text.
        message: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A previous transport or framing error left the connection unusable.
    #[error("connection is poisoned by an earlier failure")]
    ConnectionPoisoned,
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Io(io) => Self::Io(io),
            CodecError::ConnectionClosed => Self::ConnectionClosed,
            other => Self::Codec(other),
        }
    }
}

impl Error {
    /// Whether the server reported an SQL error.
    #[must_use]
    pub fn is_sql_error(&self) -> bool {
        matches!(self, Self::Sql { .. })
    }

    /// Whether the connection can no longer be used.
    ///
    /// SQL, server and reply-decoding errors leave the session in a
    /// consistent state; transport and framing failures do not.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::ConnectionClosed | Self::Codec(_) | Self::ConnectionPoisoned
        )
    }

    /// SQLCODE, if this is an SQL error.
    #[must_use]
    pub fn sql_code(&self) -> Option<i32> {
        match self {
            Self::Sql { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// SQLSTATE, if this is an SQL error.
    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Sql { state, .. } => Some(state),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_errors_are_mapped() {
        assert!(matches!(Error::from(CodecError::ConnectionClosed), Error::ConnectionClosed));
        let truncated = Error::from(CodecError::Truncated {
            expected: 6,
            actual: 2,
        });
        assert!(matches!(truncated, Error::Codec(_)));
        assert!(truncated.is_fatal());
    }

    #[test]
    fn test_framing_errors_stay_fatal() {
        let framing = Error::from(CodecError::Protocol(ProtocolError::malformed("DSS", "bad magic")));
        assert!(matches!(framing, Error::Codec(CodecError::Protocol(_))));
        assert!(framing.is_fatal());

        let reply = Error::from(ProtocolError::malformed("SQLCARD", "short"));
        assert!(!reply.is_fatal());
    }

    #[test]
    fn test_sql_error_accessors() {
        let err = Error::Sql {
            code: -204,
            state: "42704".into(),
            message: "T is an undefined name".into(),
        };
        assert!(err.is_sql_error());
        assert!(!err.is_fatal());
        assert_eq!(err.sql_code(), Some(-204));
        assert_eq!(err.sql_state(), Some("42704"));
        assert_eq!(err.to_string(), "SQL error -204 (42704): T is an undefined name");
    }
}
