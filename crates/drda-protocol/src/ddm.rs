//! DDM object layer.
//!
//! A DDM object is `LL CP data`: a 2-byte length covering the whole object,
//! a 2-byte code point and `LL - 4` bytes of data. Commands and reply
//! messages are collections whose data is itself a sequence of parameters
//! with the same layout.
//!
//! When the high bit of `LL` is set the object uses the extended-length
//! form: the low 15 bits give `4 + n`, and the `n` bytes after the code
//! point hold the real data length.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codepoint::CodePoint;
use crate::error::ProtocolError;

/// Size of the LL/CP prefix.
pub const OBJECT_HEADER_SIZE: usize = 4;

const EXTENDED_LENGTH_FLAG: u16 = 0x8000;
const EXTENDED_LENGTH_BYTES: usize = 4;

/// One DDM object or collection parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdmObject {
    /// Raw code point.
    pub code_point: u16,
    /// Object data, excluding the LL/CP prefix.
    pub data: Bytes,
}

impl DdmObject {
    /// Create an object from its code point and data.
    #[must_use]
    pub fn new(code_point: u16, data: Bytes) -> Self {
        Self { code_point, data }
    }

    /// The code point as a [`CodePoint`].
    #[must_use]
    pub fn kind(&self) -> CodePoint {
        CodePoint::from_u16(self.code_point)
    }

    /// Decode one object from the front of `src`.
    pub fn decode(src: &mut Bytes) -> Result<Self, ProtocolError> {
        if src.remaining() < OBJECT_HEADER_SIZE {
            return Err(ProtocolError::Incomplete {
                expected: OBJECT_HEADER_SIZE,
                actual: src.remaining(),
            });
        }

        let ll = src.get_u16();
        let code_point = src.get_u16();

        let data_len = if ll & EXTENDED_LENGTH_FLAG != 0 {
            let ext = ((ll & !EXTENDED_LENGTH_FLAG) as usize).saturating_sub(OBJECT_HEADER_SIZE);
            if ext == 0 || ext > 8 || src.remaining() < ext {
                return Err(ProtocolError::InvalidObjectLength {
                    code_point,
                    length: ll as usize,
                });
            }
            let mut len = 0usize;
            for _ in 0..ext {
                len = (len << 8) | src.get_u8() as usize;
            }
            len
        } else {
            let ll = ll as usize;
            if ll < OBJECT_HEADER_SIZE {
                return Err(ProtocolError::InvalidObjectLength {
                    code_point,
                    length: ll,
                });
            }
            ll - OBJECT_HEADER_SIZE
        };

        if src.remaining() < data_len {
            return Err(ProtocolError::ObjectOverrun {
                code_point,
                declared: data_len,
                available: src.remaining(),
            });
        }

        Ok(Self::new(code_point, src.split_to(data_len)))
    }

    /// Iterate the parameters of a collection object.
    #[must_use]
    pub fn params(&self) -> Objects {
        Objects::new(self.data.clone())
    }

    /// Find the first parameter with the given code point.
    ///
    /// Malformed trailing parameters end the search.
    #[must_use]
    pub fn find_param(&self, code_point: u16) -> Option<Bytes> {
        self.params()
            .map_while(Result::ok)
            .find(|p| p.code_point == code_point)
            .map(|p| p.data)
    }

    /// Find a 2-byte big-endian parameter.
    #[must_use]
    pub fn param_u16(&self, code_point: u16) -> Option<u16> {
        self.find_param(code_point)
            .filter(|d| d.len() >= 2)
            .map(|d| u16::from_be_bytes([d[0], d[1]]))
    }

    /// Encode this object with its LL/CP prefix.
    pub fn encode(&self, dst: &mut impl BufMut) {
        put_object(dst, self.code_point, &self.data);
    }
}

/// Iterator over consecutive DDM objects in a buffer.
///
/// Yields an error once and then stops if an object is malformed.
#[derive(Debug, Clone)]
pub struct Objects {
    buf: Bytes,
    failed: bool,
}

impl Objects {
    /// Iterate the objects in `buf`.
    #[must_use]
    pub fn new(buf: Bytes) -> Self {
        Self { buf, failed: false }
    }
}

impl Iterator for Objects {
    type Item = Result<DdmObject, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }
        match DdmObject::decode(&mut self.buf) {
            Ok(obj) => Some(Ok(obj)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Write `LL CP data`, switching to the extended-length form when needed.
pub fn put_object(dst: &mut impl BufMut, code_point: u16, data: &[u8]) {
    let total = data.len() + OBJECT_HEADER_SIZE;
    if total <= 0x7FFF {
        dst.put_u16(total as u16);
        dst.put_u16(code_point);
    } else {
        dst.put_u16(EXTENDED_LENGTH_FLAG | (OBJECT_HEADER_SIZE + EXTENDED_LENGTH_BYTES) as u16);
        dst.put_u16(code_point);
        dst.put_u32(data.len() as u32);
    }
    dst.put_slice(data);
}

/// Builder for a collection object (a command or reply message).
#[derive(Debug)]
pub struct DdmWriter {
    code_point: u16,
    body: BytesMut,
}

impl DdmWriter {
    /// Start a collection with the given code point.
    #[must_use]
    pub fn new(code_point: impl Into<u16>) -> Self {
        Self {
            code_point: code_point.into(),
            body: BytesMut::new(),
        }
    }

    /// Append a parameter with raw bytes.
    #[must_use]
    pub fn param(mut self, code_point: u16, data: &[u8]) -> Self {
        put_object(&mut self.body, code_point, data);
        self
    }

    /// Append a 1-byte parameter.
    #[must_use]
    pub fn param_u8(self, code_point: u16, value: u8) -> Self {
        self.param(code_point, &[value])
    }

    /// Append a 2-byte big-endian parameter.
    #[must_use]
    pub fn param_u16(self, code_point: u16, value: u16) -> Self {
        self.param(code_point, &value.to_be_bytes())
    }

    /// Append a 4-byte big-endian parameter.
    #[must_use]
    pub fn param_u32(self, code_point: u16, value: u32) -> Self {
        self.param(code_point, &value.to_be_bytes())
    }

    /// Append a nested object (already encoded with its own LL/CP).
    #[must_use]
    pub fn raw(mut self, encoded: &[u8]) -> Self {
        self.body.put_slice(encoded);
        self
    }

    /// Finish the collection and return its encoded bytes.
    #[must_use]
    pub fn finish(self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.body.len() + OBJECT_HEADER_SIZE);
        put_object(&mut out, self.code_point, &self.body);
        out.freeze()
    }
}
