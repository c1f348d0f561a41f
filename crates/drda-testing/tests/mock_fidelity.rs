//! Scripted replies must read back through the real framing layer exactly
//! as a server's bytes would.
//!
//! ```bash
//! cargo test -p drda-testing --test mock_fidelity
//! ```

#![allow(clippy::unwrap_used)]

use drda_codec::{read_chain, write_many};
use drda_protocol::{CodePoint, Dialect, SessionConfig, command};
use drda_testing::{MockColumn, MockStream, ReplyBuilder, fixtures};
use drda_types::SqlValue;

#[test]
fn test_handshake_replies_read_as_two_chains() {
    for dialect in [Dialect::Derby, Dialect::Db2] {
        let mut stream = MockStream::new()
            .with_input(fixtures::handshake(dialect).unwrap())
            .chunked(3);

        let first = read_chain(&mut stream).unwrap();
        assert_eq!(first.len(), 2);
        let second = read_chain(&mut stream).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(stream.remaining_input(), 0);

        let kinds: Vec<CodePoint> = first
            .iter()
            .chain(&second)
            .map(|u| u.objects().next().unwrap().unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            [CodePoint::ExcSatRd, CodePoint::AccSecRd, CodePoint::SecChkRm, CodePoint::AccRdbRm]
        );
    }
}

#[test]
fn test_large_result_uses_continuation_segments() {
    let columns = [MockColumn::varchar("PAYLOAD", 1000)];
    let rows: Vec<Vec<SqlValue>> = (0..100)
        .map(|i| vec![SqlValue::String(format!("{i:0>1000}"))])
        .collect();
    let bytes = ReplyBuilder::new(Dialect::Derby)
        .query_descriptor_for(&columns)
        .query_data(&rows)
        .build()
        .unwrap();

    let mut stream = MockStream::new().with_input(bytes).chunked(4096);
    let units = read_chain(&mut stream).unwrap();
    assert_eq!(units.len(), 2);
    let data = units[1].objects().next().unwrap().unwrap();
    assert_eq!(data.kind(), CodePoint::QryDta);
    assert_eq!(data.data.len(), 100 * (2 + 2 + 1000));
}

#[test]
fn test_captured_requests_decode() {
    let session = SessionConfig::new(Dialect::Derby, "TESTDB", None, None).unwrap();
    let mut stream = MockStream::new();
    write_many(
        &mut stream,
        &[
            command::execute_immediate(&session).unwrap(),
            command::sql_statement(&session, "DELETE FROM T"),
            command::commit(),
        ],
    )
    .unwrap();

    assert_eq!(
        stream.sent_code_points().unwrap(),
        [CodePoint::ExcSqlImm, CodePoint::SqlStt, CodePoint::RdbCmm]
    );
    let units = stream.written_units().unwrap();
    assert_eq!(units[0].correlation_id(), 1);
    assert_eq!(units[1].correlation_id(), 1);
    assert_eq!(units[2].correlation_id(), 2);
    assert!(!units[2].is_chained());
}
