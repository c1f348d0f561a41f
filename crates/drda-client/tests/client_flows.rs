//! Client conversations against scripted server replies.
//!
//! Each test drives a [`Client`] over a [`MockStream`] and checks both what
//! the client wrote and what it made of the replies.
//!
//! ```bash
//! cargo test -p drda-client --test client_flows
//! ```

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::NaiveDate;
use drda_client::{Client, Config, Dialect, Error, SqlValue};
use drda_protocol::CodePoint;
use drda_protocol::CodePoint::*;
use drda_testing::{MockCard, MockColumn, MockStream, ReplyBuilder, fixtures};
use rust_decimal::Decimal;

fn derby_config() -> Config {
    Config::new().database("testdb").workstation("ws01")
}

fn db2_config() -> Config {
    Config::new()
        .database("SAMPLE")
        .credentials("db2inst1", "secret")
        .workstation("ws01")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn connected(dialect: Dialect, config: Config) -> Client<MockStream> {
    init_tracing();
    let stream = MockStream::new()
        .with_input(fixtures::handshake(dialect).unwrap())
        .chunked(7);
    let mut client = Client::handshake(stream, config).unwrap();
    client.get_mut().take_written();
    client
}

fn sent(client: &mut Client<MockStream>) -> Vec<CodePoint> {
    let codes = client.get_ref().sent_code_points().unwrap();
    client.get_mut().take_written();
    codes
}

#[test]
fn test_handshake_groups() {
    for (dialect, config) in [(Dialect::Derby, derby_config()), (Dialect::Db2, db2_config())] {
        let stream = MockStream::new().with_input(fixtures::handshake(dialect).unwrap());
        let client = Client::handshake(stream, config).unwrap();
        assert_eq!(client.dialect(), dialect);

        let stream = client.get_ref();
        assert_eq!(stream.sent_code_points().unwrap(), [ExcSat, AccSec, SecChk, AccRdb]);
        let ids: Vec<u16> = stream
            .written_units()
            .unwrap()
            .iter()
            .map(|u| u.correlation_id())
            .collect();
        assert_eq!(ids, [1, 2, 1, 2]);
        assert_eq!(stream.remaining_input(), 0);
    }
}

#[test]
fn test_dialect_defaults_from_user() {
    let stream = MockStream::new().with_input(fixtures::handshake(Dialect::Db2).unwrap());
    let client = Client::handshake(stream, db2_config()).unwrap();
    assert_eq!(client.dialect(), Dialect::Db2);
    assert_eq!(client.session().user(), "db2inst1");

    let stream = MockStream::new().with_input(fixtures::handshake(Dialect::Derby).unwrap());
    let client = Client::handshake(stream, derby_config()).unwrap();
    assert_eq!(client.session().user(), "APP");
}

#[test]
fn test_rejected_security_check() {
    let stream =
        MockStream::new().with_input(fixtures::handshake_rejected(Dialect::Db2, 0x0F).unwrap());
    let err = Client::handshake(stream, db2_config()).unwrap_err();
    match err {
        Error::Server {
            code_point, message, ..
        } => {
            assert_eq!(code_point, SecChkRm);
            assert!(message.contains("0x0F"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_derby_execute() {
    let mut client = connected(Dialect::Derby, derby_config());
    client
        .get_mut()
        .push_input(fixtures::execute_ok(Dialect::Derby, 3).unwrap());

    let count = client.execute("DELETE FROM T WHERE ID > 7").unwrap();
    assert_eq!(count, 3);
    assert_eq!(sent(&mut client), [ExcSqlImm, SqlStt, RdbCmm]);
}

#[test]
fn test_execute_accepts_card_with_diagnostics_group() {
    let mut client = connected(Dialect::Derby, derby_config());
    let reply = ReplyBuilder::new(Dialect::Derby)
        .database_updated()
        .sqlcard(MockCard::updated(1).with_diagnostics())
        .end_unit_of_work()
        .sqlcard(MockCard::ok())
        .build()
        .unwrap();
    client.get_mut().push_input(reply);

    assert_eq!(client.execute("INSERT INTO T VALUES (1)").unwrap(), 1);
    assert!(!client.is_poisoned());
    assert_eq!(client.get_ref().remaining_input(), 0);
}

#[test]
fn test_malformed_reply_object_keeps_connection_usable() {
    let mut client = connected(Dialect::Derby, derby_config());
    let reply = ReplyBuilder::new(Dialect::Derby)
        .object(drda_protocol::DssType::Reply, SqlCard, &[0x00, 0x00, 0x00])
        .build()
        .unwrap();
    client.get_mut().push_input(reply);
    client
        .get_mut()
        .push_input(fixtures::execute_ok(Dialect::Derby, 2).unwrap());

    let err = client.execute("DELETE FROM T").unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "{err:?}");
    assert!(!client.is_poisoned());
    assert_eq!(client.execute("DELETE FROM T").unwrap(), 2);
}

#[test]
fn test_db2_execute_sends_statement_set_prologue() {
    let mut client = connected(Dialect::Db2, db2_config());
    client
        .get_mut()
        .push_input(fixtures::execute_ok(Dialect::Db2, 1).unwrap());

    assert_eq!(client.execute("UPDATE T SET A = 1 WHERE ID = 1").unwrap(), 1);

    let units = client.get_ref().written_units().unwrap();
    assert_eq!(units[0].correlation_id(), 1);
    assert!(!units.last().unwrap().is_chained());
    assert_eq!(
        sent(&mut client),
        [ExcSat, ExcSqlSet, SqlStt, ExcSqlImm, SqlStt, RdbCmm]
    );
}

#[test]
fn test_db2_locale_statement_when_configured() {
    let mut client = connected(Dialect::Db2, db2_config().client_locale("en_US"));
    client
        .get_mut()
        .push_input(fixtures::execute_ok(Dialect::Db2, 0).unwrap());

    client.execute("CREATE TABLE T (ID INT)").unwrap();
    assert_eq!(
        sent(&mut client),
        [ExcSat, ExcSqlSet, SqlStt, SqlStt, ExcSqlImm, SqlStt, RdbCmm]
    );
}

#[test]
fn test_derby_query() {
    let columns = [
        MockColumn::integer("ID"),
        MockColumn::varchar("NAME", 32).nullable(),
        MockColumn::decimal("PRICE", 9, 2),
        MockColumn::date("CREATED"),
    ];
    let rows = vec![
        vec![
            SqlValue::Int(1),
            SqlValue::String("alpha".into()),
            SqlValue::Decimal(Decimal::new(1999, 2)),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
        ],
        vec![
            SqlValue::Int(2),
            SqlValue::Null,
            SqlValue::Decimal(Decimal::new(-5, 2)),
            SqlValue::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
        ],
    ];

    let mut client = connected(Dialect::Derby, derby_config());
    client
        .get_mut()
        .push_input(fixtures::query(Dialect::Derby, &columns, &rows).unwrap());

    let mut rs = client.query("SELECT ID, NAME, PRICE, CREATED FROM T").unwrap();
    assert_eq!(sent(&mut client), [PrpSqlStt, SqlStt, OpnQry]);

    let names: Vec<&str> = rs.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["ID", "NAME", "PRICE", "CREATED"]);
    assert_eq!(rs.len(), 2);

    let first = rs.next_row().unwrap();
    assert_eq!(first.get::<i32>(0).unwrap(), 1);
    assert_eq!(first.get_by_name::<String>("name").unwrap(), "alpha");
    assert_eq!(first.get::<Decimal>(2).unwrap(), Decimal::new(1999, 2));

    let second = rs.next_row().unwrap();
    assert_eq!(second.get::<Option<String>>(1).unwrap(), None);
    assert_eq!(
        second.get::<NaiveDate>(3).unwrap(),
        NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()
    );
    assert!(rs.next_row().is_none());
}

#[test]
fn test_db2_query_round_trips() {
    let columns = [MockColumn::integer("ID"), MockColumn::varchar("NAME", 16)];
    let rows = vec![
        vec![SqlValue::Int(10), SqlValue::String("Müller".into())],
        vec![SqlValue::Int(-3), SqlValue::String("B".into())],
    ];

    let mut client = connected(Dialect::Db2, db2_config());
    client
        .get_mut()
        .push_input(fixtures::query(Dialect::Db2, &columns, &rows).unwrap());

    let rs = client.query("SELECT ID, NAME FROM T").unwrap();
    assert_eq!(client.get_ref().remaining_input(), 0);
    assert_eq!(
        sent(&mut client),
        [ExcSat, ExcSqlSet, SqlStt, PrpSqlStt, SqlAttr, SqlStt, OpnQry, DscSqlStt, ClsQry]
    );

    let values: Vec<Vec<SqlValue>> = rs.map(|r| r.into_values()).collect();
    assert_eq!(values, rows);
}

#[test]
fn test_db2_query_error_drains_both_chains() {
    let mut replies = ReplyBuilder::new(Dialect::Db2)
        .server_attributes()
        .sqlcard(MockCard::ok())
        .build()
        .unwrap();
    replies.extend(
        ReplyBuilder::new(Dialect::Db2)
            .sql_error_message("DB2INST1.MISSING is an undefined name")
            .sqldard(MockCard::error(-204, "42704", "DB2INST1.MISSING"), &[])
            .build()
            .unwrap(),
    );

    let mut client = connected(Dialect::Db2, db2_config());
    client.get_mut().push_input(replies);

    let err = client.query("SELECT * FROM MISSING").unwrap_err();
    assert_eq!(err.sql_code(), Some(-204));
    assert_eq!(err.sql_state(), Some("42704"));
    assert!(err.to_string().contains("undefined name"));
    assert_eq!(client.get_ref().remaining_input(), 0);
    assert_eq!(sent(&mut client).last(), Some(&OpnQry));
    assert!(!client.is_poisoned());
}

#[test]
fn test_sql_error_uses_error_message_text() {
    let mut client = connected(Dialect::Derby, derby_config());
    client.get_mut().push_input(
        fixtures::execute_error(
            Dialect::Derby,
            -30000,
            "42X05",
            "Table/View 'NOPE' does not exist.",
        )
        .unwrap(),
    );

    let err = client.execute("DROP TABLE NOPE").unwrap_err();
    match &err {
        Error::Sql {
            code,
            state,
            message,
        } => {
            assert_eq!(*code, -30000);
            assert_eq!(state, "42X05");
            assert_eq!(message, "Table/View 'NOPE' does not exist.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_fatal());
    assert!(!client.is_poisoned());
}

#[test]
fn test_commit_then_query_without_rehandshake() {
    let columns = [MockColumn::integer("N")];
    let rows = vec![vec![SqlValue::Int(42)]];

    let mut client = connected(Dialect::Derby, derby_config());
    let stream = client.get_mut();
    stream.push_input(fixtures::execute_ok(Dialect::Derby, 1).unwrap());
    stream.push_input(fixtures::execute_ok(Dialect::Derby, 0).unwrap());
    stream.push_input(fixtures::query(Dialect::Derby, &columns, &rows).unwrap());

    client.execute("INSERT INTO T VALUES (42)").unwrap();
    client.execute("COMMIT").unwrap();
    let mut rs = client.query("SELECT N FROM T").unwrap();
    assert_eq!(rs.next_row().unwrap().get::<i32>(0).unwrap(), 42);

    let codes = sent(&mut client);
    assert!(!codes.contains(&ExcSat));
    assert!(!codes.contains(&SecChk));
}

#[test]
fn test_transaction_statements() {
    let mut client = connected(Dialect::Derby, derby_config());
    for _ in 0..3 {
        client
            .get_mut()
            .push_input(fixtures::execute_ok(Dialect::Derby, 0).unwrap());
    }

    client.begin().unwrap();
    client.rollback().unwrap();
    client.commit().unwrap();
    assert_eq!(sent(&mut client).len(), 9);
}

#[test]
fn test_execute_with_binds_parameters() {
    let mut client = connected(Dialect::Derby, derby_config());
    client
        .get_mut()
        .push_input(fixtures::execute_ok(Dialect::Derby, 1).unwrap());

    let name = "O'Brien";
    let count = client
        .execute_with("INSERT INTO T (ID, NAME) VALUES (?, ?)", &[&5i32, &name])
        .unwrap();
    assert_eq!(count, 1);

    let written = client.get_ref().written().to_vec();
    let needle = b"VALUES (5, 'O''Brien')";
    assert!(written.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn test_parameter_count_mismatch_sends_nothing() {
    let mut client = connected(Dialect::Derby, derby_config());
    let err = client.query_with("SELECT * FROM T WHERE ID = ?", &[]).unwrap_err();
    assert!(matches!(err, Error::Type(_)));
    assert!(client.get_ref().written().is_empty());
    assert!(!client.is_poisoned());
}

#[test]
fn test_closed_connection_poisons_client() {
    let mut client = connected(Dialect::Derby, derby_config());

    let err = client.execute("DELETE FROM T").unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));
    assert!(client.is_poisoned());

    client
        .get_mut()
        .push_input(fixtures::execute_ok(Dialect::Derby, 0).unwrap());
    assert!(matches!(client.query("SELECT 1 FROM T"), Err(Error::ConnectionPoisoned)));
}

#[test]
fn test_write_failure_poisons_client() {
    let stream = MockStream::new()
        .with_input(fixtures::handshake(Dialect::Derby).unwrap())
        .failing_writes(std::io::ErrorKind::BrokenPipe);
    let err = Client::handshake(stream, derby_config()).unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    assert!(err.is_fatal());
}

#[test]
fn test_truncated_reply_is_framing_error() {
    let mut client = connected(Dialect::Derby, derby_config());
    let mut reply = fixtures::execute_ok(Dialect::Derby, 1).unwrap();
    reply.truncate(reply.len() - 3);
    client.get_mut().push_input(reply);

    let err = client.execute("DELETE FROM T").unwrap_err();
    assert!(matches!(err, Error::Codec(_)));
    assert!(client.is_poisoned());
}

#[test]
fn test_close_commits() {
    let mut client = connected(Dialect::Derby, derby_config());
    client
        .get_mut()
        .push_input(fixtures::close(Dialect::Derby).unwrap());
    client.close().unwrap();
}

#[test]
fn test_close_without_reply_fails() {
    let client = connected(Dialect::Derby, derby_config());
    assert!(matches!(client.close(), Err(Error::ConnectionClosed)));
}

#[test]
fn test_configuration_errors_before_io() {
    assert!(matches!(
        Config::from_connection_string("Database=testdb;Dialect=informix"),
        Err(Error::Config(_))
    ));
    assert!(matches!(Client::connect(Config::new()), Err(Error::Config(_))));
}
