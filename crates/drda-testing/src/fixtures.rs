//! Canned server conversations.
//!
//! Each function returns the reply chains a server sends for one client
//! phase, concatenated in the order the client reads them.

use drda_protocol::{Dialect, SecurityMechanism};
use drda_types::SqlValue;

use crate::replies::{MockCard, MockColumn, MockError, ReplyBuilder};

fn security_mechanism(dialect: Dialect) -> SecurityMechanism {
    match dialect {
        Dialect::Derby => SecurityMechanism::UserIdOnly,
        Dialect::Db2 => SecurityMechanism::UserIdPassword,
    }
}

/// Replies to EXCSAT+ACCSEC and SECCHK+ACCRDB.
pub fn handshake(dialect: Dialect) -> Result<Vec<u8>, MockError> {
    let mut out = ReplyBuilder::new(dialect)
        .server_attributes()
        .access_security(security_mechanism(dialect).code())
        .build()?;
    out.extend(
        ReplyBuilder::new(dialect)
            .security_check(0)
            .access_database()
            .build()?,
    );
    Ok(out)
}

/// Handshake replies where the security check fails with `code`.
pub fn handshake_rejected(dialect: Dialect, code: u8) -> Result<Vec<u8>, MockError> {
    let mut out = ReplyBuilder::new(dialect)
        .server_attributes()
        .access_security(security_mechanism(dialect).code())
        .build()?;
    out.extend(ReplyBuilder::new(dialect).security_check(code).build()?);
    Ok(out)
}

/// Start of an execute reply chain; Db2 answers the statement-set prologue
/// in the same chain.
fn execute_prologue(dialect: Dialect) -> ReplyBuilder {
    let builder = ReplyBuilder::new(dialect);
    match dialect {
        Dialect::Derby => builder,
        Dialect::Db2 => builder.server_attributes().sqlcard(MockCard::ok()),
    }
}

/// Reply to a successful execute that changed `update_count` rows.
pub fn execute_ok(dialect: Dialect, update_count: i32) -> Result<Vec<u8>, MockError> {
    execute_prologue(dialect)
        .database_updated()
        .sqlcard(MockCard::updated(update_count))
        .end_unit_of_work()
        .sqlcard(MockCard::ok())
        .build()
}

/// Reply to an execute that fails with an SQLERRRM and a failing SQLCARD.
pub fn execute_error(
    dialect: Dialect,
    code: i32,
    state: &str,
    message: &str,
) -> Result<Vec<u8>, MockError> {
    execute_prologue(dialect)
        .sql_error_message(message)
        .sqlcard(MockCard::error(code, state, ""))
        .end_unit_of_work()
        .sqlcard(MockCard::ok())
        .build()
}

/// Reply chain carrying a described, opened and fully fetched result set.
#[must_use]
pub fn result_set(dialect: Dialect, columns: &[MockColumn], rows: &[Vec<SqlValue>]) -> ReplyBuilder {
    ReplyBuilder::new(dialect)
        .sqldard(MockCard::ok(), columns)
        .open_query()
        .query_descriptor_for(columns)
        .query_data(rows)
        .end_query()
        .sqlcard(MockCard::end_of_data())
}

/// All replies for one query.
///
/// Derby answers in a single chain. Db2 ends a chain after the
/// statement-set prologue, then sends the result chain, then one chain each
/// for the describe and close round trips.
pub fn query(
    dialect: Dialect,
    columns: &[MockColumn],
    rows: &[Vec<SqlValue>],
) -> Result<Vec<u8>, MockError> {
    let result = result_set(dialect, columns, rows).build()?;
    match dialect {
        Dialect::Derby => Ok(result),
        Dialect::Db2 => {
            let mut out = ReplyBuilder::new(dialect)
                .server_attributes()
                .sqlcard(MockCard::ok())
                .build()?;
            out.extend(result);
            out.extend(describe_and_close(columns)?);
            Ok(out)
        }
    }
}

/// Db2 replies to the describe and close round trips after a query.
pub fn describe_and_close(columns: &[MockColumn]) -> Result<Vec<u8>, MockError> {
    let mut out = ReplyBuilder::new(Dialect::Db2)
        .sqldard(MockCard::ok(), columns)
        .build()?;
    out.extend(ReplyBuilder::new(Dialect::Db2).sqlcard(MockCard::ok()).build()?);
    Ok(out)
}

/// Reply to the RDBCMM sent on close.
pub fn close(dialect: Dialect) -> Result<Vec<u8>, MockError> {
    ReplyBuilder::new(dialect)
        .end_unit_of_work()
        .sqlcard(MockCard::ok())
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::Bytes;
    use drda_protocol::DssUnit;

    use super::*;

    fn chain_count(bytes: Vec<u8>) -> usize {
        let mut src = Bytes::from(bytes);
        let mut chains = 0;
        while !src.is_empty() {
            if !DssUnit::decode(&mut src).unwrap().is_chained() {
                chains += 1;
            }
        }
        chains
    }

    #[test]
    fn test_chain_counts() {
        let columns = [MockColumn::integer("ID")];
        let rows = [vec![SqlValue::Int(1)]];
        assert_eq!(chain_count(handshake(Dialect::Derby).unwrap()), 2);
        assert_eq!(chain_count(query(Dialect::Derby, &columns, &rows).unwrap()), 1);
        assert_eq!(chain_count(query(Dialect::Db2, &columns, &rows).unwrap()), 4);
        assert_eq!(chain_count(execute_ok(Dialect::Db2, 1).unwrap()), 1);
    }
}
