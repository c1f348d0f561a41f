//! In-memory byte stream with scripted reads and captured writes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use drda_testing::{MockStream, ReplyBuilder};
//!
//! let replies = ReplyBuilder::new(Dialect::Derby).sqlcard(MockCard::ok()).build()?;
//! let mut stream = MockStream::new().with_input(&replies);
//! // drive a client over `stream`, then inspect what it sent
//! let sent = stream.sent_code_points()?;
//! ```

use std::io::{self, Read, Write};

use bytes::{Buf, Bytes, BytesMut};
use drda_protocol::{CodePoint, DdmObject, DssUnit, ProtocolError};

/// A `Read + Write` stream backed by memory.
///
/// Reads drain the scripted input and report end of stream once it is
/// exhausted. Writes are appended to a capture buffer.
#[derive(Debug, Default)]
pub struct MockStream {
    input: BytesMut,
    written: Vec<u8>,
    read_chunk: Option<usize>,
    write_error: Option<io::ErrorKind>,
}

impl MockStream {
    /// Create an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append scripted input.
    #[must_use]
    pub fn with_input(mut self, data: impl AsRef<[u8]>) -> Self {
        self.push_input(data);
        self
    }

    /// Return at most `max` bytes per read call.
    #[must_use]
    pub fn chunked(mut self, max: usize) -> Self {
        self.read_chunk = Some(max.max(1));
        self
    }

    /// Fail every write with `kind`.
    #[must_use]
    pub fn failing_writes(mut self, kind: io::ErrorKind) -> Self {
        self.write_error = Some(kind);
        self
    }

    /// Append scripted input.
    pub fn push_input(&mut self, data: impl AsRef<[u8]>) {
        self.input.extend_from_slice(data.as_ref());
    }

    /// Bytes of scripted input not yet read.
    #[must_use]
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }

    /// Everything written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take and clear the capture buffer.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Decode the captured bytes into DSS units.
    pub fn written_units(&self) -> Result<Vec<DssUnit>, ProtocolError> {
        let mut src = Bytes::copy_from_slice(&self.written);
        let mut units = Vec::new();
        while src.has_remaining() {
            units.push(DssUnit::decode(&mut src)?);
        }
        Ok(units)
    }

    /// Code point of the first object in every captured unit.
    pub fn sent_code_points(&self) -> Result<Vec<CodePoint>, ProtocolError> {
        self.written_units()?
            .iter()
            .map(|unit| {
                let mut payload = unit.payload.clone();
                DdmObject::decode(&mut payload).map(|obj| obj.kind())
            })
            .collect()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = buf.len().min(self.input.len());
        if let Some(max) = self.read_chunk {
            n = n.min(max);
        }
        buf[..n].copy_from_slice(&self.input[..n]);
        self.input.advance(n);
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(io::Error::new(kind, "scripted write failure"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_reads() {
        let mut stream = MockStream::new().with_input([1, 2, 3, 4, 5]).chunked(2);
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(stream.read(&mut buf).unwrap(), 1);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_write_capture_and_failure() {
        let mut stream = MockStream::new();
        stream.write_all(b"abc").unwrap();
        assert_eq!(stream.written(), b"abc");
        assert_eq!(stream.take_written(), b"abc");
        assert!(stream.written().is_empty());

        let mut broken = MockStream::new().failing_writes(io::ErrorKind::BrokenPipe);
        let err = broken.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
