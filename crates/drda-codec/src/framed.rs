//! Reading and writing DSS units over a blocking byte stream.

use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};
use drda_protocol::dss::segment;
use drda_protocol::{CodePoint, DSS_HEADER_SIZE, DssFlags, DssHeader, DssType, DssUnit};

use crate::error::CodecError;

/// Fill `buf` from the stream.
///
/// A clean end of stream before the first byte of a unit is reported as
/// [`CodecError::ConnectionClosed`] when `at_unit_start` is set; any other
/// short read is [`CodecError::Truncated`].
fn fill(stream: &mut impl Read, buf: &mut [u8], at_unit_start: bool) -> Result<(), CodecError> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 && at_unit_start => return Err(CodecError::ConnectionClosed),
            Ok(0) => {
                return Err(CodecError::Truncated {
                    expected: buf.len(),
                    actual: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Read one DSS unit, reassembling continuation segments.
pub fn read_unit(stream: &mut impl Read) -> Result<DssUnit, CodecError> {
    let mut header_buf = [0u8; DSS_HEADER_SIZE];
    fill(stream, &mut header_buf, true)?;
    let header = DssHeader::decode(&mut &header_buf[..])?;

    let mut payload = BytesMut::zeroed(header.segment_payload_length());
    fill(stream, &mut payload, false)?;

    if header.has_continuation() {
        let mut more = true;
        while more {
            let mut prefix = [0u8; segment::PREFIX_SIZE];
            fill(stream, &mut prefix, false)?;
            let prefix = u16::from_be_bytes(prefix);
            more = segment::has_more(prefix);

            let start = payload.len();
            payload.resize(start + segment::payload_length(prefix), 0);
            fill(stream, &mut payload[start..], false)?;
        }
    }

    tracing::trace!(
        correlation_id = header.correlation_id,
        dss_type = ?header.dss_type,
        chained = header.is_chained(),
        length = payload.len(),
        "read DSS unit"
    );

    Ok(DssUnit::new(header, payload.freeze()))
}

/// Code point of an encoded DDM object.
fn leading_code_point(payload: &[u8]) -> CodePoint {
    match payload {
        [_, _, hi, lo, ..] => CodePoint::from_u16(u16::from_be_bytes([*hi, *lo])),
        _ => CodePoint::Unknown(0),
    }
}

/// Whether `payload` is a command data object (SQLSTT or SQLATTR).
#[must_use]
pub fn is_command_object(payload: &[u8]) -> bool {
    leading_code_point(payload).is_command_object()
}

/// Wrap one command payload in a DSS unit and write it.
///
/// SQLSTT and SQLATTR payloads are sent as object units, everything else as
/// request units. Returns the correlation id for the next unit: unchanged
/// when `same_correlation_as_next` is set, otherwise incremented.
pub fn write_request(
    stream: &mut impl Write,
    payload: &[u8],
    correlation_id: u16,
    same_correlation_as_next: bool,
    last: bool,
) -> Result<u16, CodecError> {
    let code_point = leading_code_point(payload);
    let dss_type = if code_point.is_command_object() {
        DssType::Object
    } else {
        DssType::Request
    };

    let flags = if same_correlation_as_next {
        DssFlags::CHAINED | DssFlags::SAME_CORRELATOR
    } else if !last {
        DssFlags::CHAINED
    } else {
        DssFlags::empty()
    };

    let unit = DssUnit::frame(dss_type, flags, correlation_id, payload);
    stream.write_all(&unit)?;

    tracing::trace!(
        correlation_id,
        dss_type = ?dss_type,
        chained = flags.contains(DssFlags::CHAINED),
        code_point = %code_point,
        "wrote DSS unit"
    );

    Ok(if same_correlation_as_next {
        correlation_id
    } else {
        correlation_id.wrapping_add(1)
    })
}

/// Write `payloads` as one chained group starting at correlation id 1, then
/// flush. The final unit is unchained.
pub fn write_many<P: AsRef<[u8]>>(
    stream: &mut impl Write,
    payloads: &[P],
) -> Result<u16, CodecError> {
    let mut correlation_id = 1;
    for (i, payload) in payloads.iter().enumerate() {
        let same_as_next = payloads
            .get(i + 1)
            .is_some_and(|next| is_command_object(next.as_ref()));
        let last = i + 1 == payloads.len();
        correlation_id = write_request(stream, payload.as_ref(), correlation_id, same_as_next, last)?;
    }
    stream.flush()?;
    Ok(correlation_id)
}

/// Read units until one arrives without the chained flag.
pub fn read_chain(stream: &mut impl Read) -> Result<Vec<DssUnit>, CodecError> {
    let mut units = Vec::new();
    loop {
        let unit = read_unit(stream)?;
        let chained = unit.is_chained();
        units.push(unit);
        if !chained {
            return Ok(units);
        }
    }
}

/// Concatenate the payloads of a chain.
#[must_use]
pub fn chain_payload(units: &[DssUnit]) -> Bytes {
    let mut buf = BytesMut::with_capacity(units.iter().map(|u| u.payload.len()).sum());
    for unit in units {
        buf.extend_from_slice(&unit.payload);
    }
    buf.freeze()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use drda_protocol::{ProtocolError, command, Dialect, SessionConfig};

    use super::*;

    fn reply(chained: bool, correlation_id: u16, payload: &[u8]) -> Vec<u8> {
        let flags = if chained { DssFlags::CHAINED } else { DssFlags::empty() };
        DssUnit::frame(DssType::Reply, flags, correlation_id, payload).to_vec()
    }

    #[test]
    fn test_read_unit() {
        let mut src = Cursor::new(reply(true, 7, &[0x00, 0x04, 0x24, 0x1B]));
        let unit = read_unit(&mut src).unwrap();
        assert!(unit.is_chained());
        assert_eq!(unit.correlation_id(), 7);
        assert_eq!(unit.header.dss_type, DssType::Reply);
        assert_eq!(&unit.payload[..], &[0x00, 0x04, 0x24, 0x1B]);
    }

    #[test]
    fn test_clean_close_is_connection_closed() {
        let mut src = Cursor::new(Vec::new());
        assert!(matches!(read_unit(&mut src), Err(CodecError::ConnectionClosed)));
    }

    #[test]
    fn test_close_mid_header_is_truncated() {
        let mut src = Cursor::new(vec![0x00, 0x0A, 0xD0]);
        let err = read_unit(&mut src).unwrap_err();
        assert!(err.is_framing());
        assert!(matches!(err, CodecError::Truncated { expected: 6, actual: 3 }));
    }

    #[test]
    fn test_declared_length_beyond_stream_is_truncated() {
        let mut src = Cursor::new(vec![0x00, 0x40, 0xD0, 0x02, 0x00, 0x01, 0xAA, 0xBB]);
        assert!(matches!(
            read_unit(&mut src),
            Err(CodecError::Truncated { expected: 58, actual: 2 })
        ));
    }

    #[test]
    fn test_bad_magic_is_protocol_error() {
        let mut src = Cursor::new(vec![0x00, 0x06, 0xAA, 0x02, 0x00, 0x01]);
        assert!(matches!(
            read_unit(&mut src),
            Err(CodecError::Protocol(ProtocolError::InvalidMagic(0xAA)))
        ));
    }

    #[test]
    fn test_continuation_segments_reassembled() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let mut src = Cursor::new(reply(false, 1, &payload));
        let unit = read_unit(&mut src).unwrap();
        assert_eq!(unit.payload.len(), payload.len());
        assert_eq!(&unit.payload[..], &payload[..]);
    }

    #[test]
    fn test_read_chain_stops_at_unchained() {
        let mut bytes = reply(true, 1, &[0x00, 0x04, 0x12, 0x19]);
        bytes.extend(reply(true, 2, &[0x00, 0x04, 0x22, 0x01]));
        bytes.extend(reply(false, 2, &[0x00, 0x04, 0x24, 0x08]));
        bytes.extend(reply(false, 1, &[0x00, 0x04, 0x14, 0x43]));
        let mut src = Cursor::new(bytes);

        let chain = read_chain(&mut src).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain_payload(&chain).len(), 12);
        // The unit after the chain is left unread
        assert_eq!(read_unit(&mut src).unwrap().correlation_id(), 1);
    }

    #[test]
    fn test_write_request_flags_and_ids() {
        let session = SessionConfig::new(Dialect::Derby, "db", None, None).unwrap();
        let mut out = Vec::new();

        let next = write_request(&mut out, &command::execute_immediate(&session).unwrap(), 1, true, false).unwrap();
        assert_eq!(next, 1);
        assert_eq!(out[3], 0x51);

        let start = out.len();
        let next = write_request(&mut out, &command::sql_statement(&session, "VALUES 1"), next, false, false).unwrap();
        assert_eq!(next, 2);
        assert_eq!(out[start + 3], 0x43);
        assert_eq!(&out[start + 4..start + 6], &[0x00, 0x01]);

        let start = out.len();
        let next = write_request(&mut out, &command::commit(), next, false, true).unwrap();
        assert_eq!(next, 3);
        assert_eq!(out[start + 3], 0x01);
        assert_eq!(&out[start + 4..start + 6], &[0x00, 0x02]);
    }

    #[test]
    fn test_write_many_chains_objects_under_command_id() {
        let session = SessionConfig::new(Dialect::Db2, "SAMPLE", Some("u"), Some("p")).unwrap();
        let payloads = vec![
            command::exchange_manager_levels(command::STATEMENT_MANAGER_LEVELS),
            command::prepare_db2(&session).unwrap(),
            command::sql_attributes(&session, "WITH HOLD "),
            command::sql_statement(&session, "SELECT 1 FROM SYSIBM.SYSDUMMY1"),
            command::open_query_db2(&session).unwrap(),
        ];
        let mut out = Vec::new();
        let next = write_many(&mut out, &payloads).unwrap();
        assert_eq!(next, 4);

        let mut src = Bytes::from(out);
        let mut seen = Vec::new();
        while !src.is_empty() {
            let unit = DssUnit::decode(&mut src).unwrap();
            seen.push((unit.header.dss_type, unit.header.flags, unit.correlation_id()));
        }
        let chained_same = DssFlags::CHAINED | DssFlags::SAME_CORRELATOR;
        assert_eq!(
            seen,
            vec![
                (DssType::Request, DssFlags::CHAINED, 1),
                (DssType::Request, chained_same, 2),
                (DssType::Object, chained_same, 2),
                (DssType::Object, DssFlags::CHAINED, 2),
                (DssType::Request, DssFlags::empty(), 3),
            ]
        );
    }
}
