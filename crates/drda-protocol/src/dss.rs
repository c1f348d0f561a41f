//! DSS (Data Stream Structure) header definitions.
//!
//! Every DRDA exchange is a sequence of DSS units. Each unit begins with a
//! 6-byte big-endian header:
//!
//! ```text
//! +--------+------+--------+----------------+
//! | length | 0xD0 | format | correlation id |
//! |   2    |  1   |   1    |       2        |
//! +--------+------+--------+----------------+
//! ```
//!
//! A length with the high bit set announces continuation segments, each
//! prefixed by its own 2-byte length (see [`segment`]).

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::ddm::Objects;
use crate::error::ProtocolError;

/// DSS header size in bytes.
pub const DSS_HEADER_SIZE: usize = 6;

/// Magic byte carried at offset 2 of every DSS header.
pub const DSS_MAGIC: u8 = 0xD0;

/// Largest length a single DSS segment can declare.
pub const MAX_SEGMENT_LENGTH: usize = 0x7FFF;

/// Length bit announcing that continuation segments follow.
pub const CONTINUATION_FLAG: u16 = 0x8000;

/// DSS type, carried in the low nibble of the format byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DssType {
    /// Request DSS.
    Request = 0x01,
    /// Reply DSS.
    Reply = 0x02,
    /// Object DSS.
    Object = 0x03,
    /// Encrypted object DSS.
    EncryptedObject = 0x04,
    /// Request DSS that expects no reply.
    RequestNoReply = 0x05,
}

impl DssType {
    /// Create a DSS type from the low nibble of a format byte.
    pub fn from_u8(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0x01 => Ok(Self::Request),
            0x02 => Ok(Self::Reply),
            0x03 => Ok(Self::Object),
            0x04 => Ok(Self::EncryptedObject),
            0x05 => Ok(Self::RequestNoReply),
            _ => Err(ProtocolError::InvalidDssType(value)),
        }
    }
}

bitflags! {
    /// DSS format flags (high nibble of the format byte).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DssFlags: u8 {
        /// Another DSS unit follows in this exchange.
        const CHAINED = 0x40;
        /// Continue processing the chain if this request fails.
        const CONTINUE_ON_ERROR = 0x20;
        /// The next unit uses the same correlation id.
        const SAME_CORRELATOR = 0x10;
    }
}

/// DSS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DssHeader {
    /// Raw length field, including the header and the continuation bit.
    pub length: u16,
    /// Type of unit.
    pub dss_type: DssType,
    /// Format flags.
    pub flags: DssFlags,
    /// Correlation id linking requests and replies.
    pub correlation_id: u16,
}

impl DssHeader {
    /// Create a header for a single-segment unit carrying `payload_len` bytes.
    pub fn new(
        dss_type: DssType,
        flags: DssFlags,
        correlation_id: u16,
        payload_len: usize,
    ) -> Result<Self, ProtocolError> {
        let total = payload_len + DSS_HEADER_SIZE;
        if total > MAX_SEGMENT_LENGTH {
            return Err(ProtocolError::InvalidLength(total));
        }
        Ok(Self {
            length: total as u16,
            dss_type,
            flags,
            correlation_id,
        })
    }

    /// Parse a DSS header.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        if src.remaining() < DSS_HEADER_SIZE {
            return Err(ProtocolError::Incomplete {
                expected: DSS_HEADER_SIZE,
                actual: src.remaining(),
            });
        }

        let length = src.get_u16();
        let magic = src.get_u8();
        if magic != DSS_MAGIC {
            return Err(ProtocolError::InvalidMagic(magic));
        }
        let format = src.get_u8();
        let dss_type = DssType::from_u8(format & 0x0F)?;
        let flags = DssFlags::from_bits_truncate(format & 0xF0);
        let correlation_id = src.get_u16();

        let header = Self {
            length,
            dss_type,
            flags,
            correlation_id,
        };
        if header.segment_length() < DSS_HEADER_SIZE {
            return Err(ProtocolError::InvalidLength(header.segment_length()));
        }
        Ok(header)
    }

    /// Encode the header.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u16(self.length);
        dst.put_u8(DSS_MAGIC);
        dst.put_u8(self.flags.bits() | self.dss_type as u8);
        dst.put_u16(self.correlation_id);
    }

    /// Length of the first segment, header included.
    #[must_use]
    pub const fn segment_length(&self) -> usize {
        (self.length & !CONTINUATION_FLAG) as usize
    }

    /// Payload bytes carried by the first segment.
    #[must_use]
    pub const fn segment_payload_length(&self) -> usize {
        self.segment_length().saturating_sub(DSS_HEADER_SIZE)
    }

    /// Whether continuation segments follow the first one.
    #[must_use]
    pub const fn has_continuation(&self) -> bool {
        self.length & CONTINUATION_FLAG != 0
    }

    /// Whether another unit follows in this exchange.
    #[must_use]
    pub const fn is_chained(&self) -> bool {
        self.flags.contains(DssFlags::CHAINED)
    }

    /// Whether the next unit shares this correlation id.
    #[must_use]
    pub const fn is_same_correlator(&self) -> bool {
        self.flags.contains(DssFlags::SAME_CORRELATOR)
    }
}

/// Continuation segment helpers.
pub mod segment {
    use super::CONTINUATION_FLAG;

    /// Size of a continuation segment's length prefix.
    pub const PREFIX_SIZE: usize = 2;

    /// Payload bytes carried by a continuation segment with the given prefix.
    #[must_use]
    pub const fn payload_length(prefix: u16) -> usize {
        ((prefix & !CONTINUATION_FLAG) as usize).saturating_sub(PREFIX_SIZE)
    }

    /// Whether another continuation segment follows this one.
    #[must_use]
    pub const fn has_more(prefix: u16) -> bool {
        prefix & CONTINUATION_FLAG != 0
    }
}

/// One reassembled DSS unit: header plus complete payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DssUnit {
    /// Unit header as read from the wire.
    pub header: DssHeader,
    /// Payload with continuation segments concatenated.
    pub payload: Bytes,
}

impl DssUnit {
    /// Create a unit from a header and its payload.
    #[must_use]
    pub fn new(header: DssHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Whether another unit follows in this exchange.
    #[must_use]
    pub fn is_chained(&self) -> bool {
        self.header.is_chained()
    }

    /// Correlation id of the unit.
    #[must_use]
    pub fn correlation_id(&self) -> u16 {
        self.header.correlation_id
    }

    /// Iterate the DDM objects carried in the payload.
    #[must_use]
    pub fn objects(&self) -> Objects {
        Objects::new(self.payload.clone())
    }

    /// Frame `payload` as one unit, splitting into continuation segments
    /// when it does not fit a single segment.
    pub fn frame(
        dss_type: DssType,
        flags: DssFlags,
        correlation_id: u16,
        payload: &[u8],
    ) -> Bytes {
        let first_capacity = MAX_SEGMENT_LENGTH - DSS_HEADER_SIZE;
        let mut buf = BytesMut::with_capacity(payload.len() + DSS_HEADER_SIZE + 16);

        if payload.len() <= first_capacity {
            let header = DssHeader {
                length: (payload.len() + DSS_HEADER_SIZE) as u16,
                dss_type,
                flags,
                correlation_id,
            };
            header.encode(&mut buf);
            buf.put_slice(payload);
            return buf.freeze();
        }

        let header = DssHeader {
            length: CONTINUATION_FLAG | MAX_SEGMENT_LENGTH as u16,
            dss_type,
            flags,
            correlation_id,
        };
        header.encode(&mut buf);
        buf.put_slice(&payload[..first_capacity]);

        let segment_capacity = MAX_SEGMENT_LENGTH - segment::PREFIX_SIZE;
        let mut rest = &payload[first_capacity..];
        while !rest.is_empty() {
            let take = rest.len().min(segment_capacity);
            let mut prefix = (take + segment::PREFIX_SIZE) as u16;
            if take < rest.len() {
                prefix |= CONTINUATION_FLAG;
            }
            buf.put_u16(prefix);
            buf.put_slice(&rest[..take]);
            rest = &rest[take..];
        }
        buf.freeze()
    }

    /// Decode one complete unit from an in-memory buffer, consuming exactly
    /// its bytes.
    pub fn decode(src: &mut Bytes) -> Result<Self, ProtocolError> {
        let header = DssHeader::decode(src)?;
        let first = header.segment_payload_length();
        if src.remaining() < first {
            return Err(ProtocolError::Incomplete {
                expected: first,
                actual: src.remaining(),
            });
        }
        if !header.has_continuation() {
            return Ok(Self::new(header, src.split_to(first)));
        }

        let mut payload = BytesMut::from(&src.split_to(first)[..]);
        loop {
            if src.remaining() < segment::PREFIX_SIZE {
                return Err(ProtocolError::Incomplete {
                    expected: segment::PREFIX_SIZE,
                    actual: src.remaining(),
                });
            }
            let prefix = src.get_u16();
            let len = segment::payload_length(prefix);
            if src.remaining() < len {
                return Err(ProtocolError::Incomplete {
                    expected: len,
                    actual: src.remaining(),
                });
            }
            payload.put_slice(&src.split_to(len));
            if !segment::has_more(prefix) {
                break;
            }
        }
        Ok(Self::new(header, payload.freeze()))
    }
}
