//! Command payload builders.
//!
//! Each function returns the encoded bytes of one DDM command or command
//! data object, ready to be framed in a DSS unit. Builders are pure: they
//! read the [`SessionConfig`] and perform no I/O.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codepoint::{CodePoint, param};
use crate::ddm::{DdmWriter, put_object};
use crate::encoding::Encoding;
use crate::error::ProtocolError;
use crate::session::{Dialect, RDB_NAME_LENGTH, SessionConfig};

/// Name the client reports in EXCSAT.
pub const CLIENT_NAME: &str = "drda-rs";

/// Client release level reported in EXCSAT.
pub const CLIENT_RELEASE: &str = "DRS01000";

/// RDB collection id of the dynamic SQL package.
const PACKAGE_COLLECTION: &str = "NULLID";
/// Package id of the dynamic SQL package.
const PACKAGE_ID: &str = "SYSSH200";
/// Package consistency token.
const PACKAGE_TOKEN: &str = "SYSLVL01";
const PACKAGE_TOKEN_LENGTH: usize = 8;

/// Correlation token sent in ACCRDB.
const CORRELATION_TOKEN: &str = "DRDARS01.CLIENT";

/// Query block size requested in OPNQRY.
pub const QUERY_BLOCK_SIZE: u32 = 0x0000_FFFF;

/// TYPSQLDA value requesting a standard output descriptor.
const TYPSQLDA_STANDARD_OUTPUT: u8 = 0x01;

/// QRYCLSIMP value asking the server to close the query at end of data.
const QRYCLSIMP_YES: u8 = 0x01;

/// Manager levels negotiated in the initial EXCSAT.
pub const HANDSHAKE_MANAGER_LEVELS: &[(u16, u16)] = &[
    (param::AGENT, 10),
    (param::SQLAM, 11),
    (param::CMNTCPIP, 5),
    (param::RDB, 12),
    (param::SECMGR, 9),
    (param::UNICODEMGR, 1208),
];

/// Manager levels re-sent ahead of each Db2 statement group.
pub const STATEMENT_MANAGER_LEVELS: &[(u16, u16)] = &[(param::CCSIDMGR, 1208)];

fn manager_level_list(levels: &[(u16, u16)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(levels.len() * 4);
    for &(manager, level) in levels {
        buf.put_u16(manager);
        buf.put_u16(level);
    }
    buf
}

/// PKGNAMCSN: RDB name, collection, package id, consistency token and
/// section number.
fn package_name(session: &SessionConfig) -> Result<Vec<u8>, ProtocolError> {
    let enc = session.encoding();
    let mut buf = Vec::with_capacity(RDB_NAME_LENGTH * 3 + PACKAGE_TOKEN_LENGTH + 2);
    buf.extend_from_slice(session.rdb_name());
    buf.extend(enc.encode_fixed(PACKAGE_COLLECTION, RDB_NAME_LENGTH)?);
    buf.extend(enc.encode_fixed(PACKAGE_ID, RDB_NAME_LENGTH)?);
    buf.extend(enc.encode_fixed(PACKAGE_TOKEN, PACKAGE_TOKEN_LENGTH)?);
    buf.put_u16(session.dialect().package_section());
    Ok(buf)
}

/// EXCSAT carrying the client identity and manager levels.
///
/// Identity strings are always EBCDIC since they precede negotiation.
pub fn exchange_server_attributes(
    workstation: &str,
    levels: &[(u16, u16)],
) -> Result<Bytes, ProtocolError> {
    let ebcdic = Encoding::Cp500;
    Ok(DdmWriter::new(CodePoint::ExcSat)
        .param(param::EXTNAM, &ebcdic.encode(CLIENT_NAME)?)
        .param(param::SRVNAM, &ebcdic.encode(workstation)?)
        .param(param::SRVRLSLV, &ebcdic.encode(CLIENT_RELEASE)?)
        .param(param::MGRLVLLS, &manager_level_list(levels))
        .param(param::SRVCLSNM, &ebcdic.encode(CLIENT_NAME)?)
        .finish())
}

/// EXCSAT carrying only a manager-level list.
#[must_use]
pub fn exchange_manager_levels(levels: &[(u16, u16)]) -> Bytes {
    DdmWriter::new(CodePoint::ExcSat)
        .param(param::MGRLVLLS, &manager_level_list(levels))
        .finish()
}

/// ACCSEC: security mechanism and database name.
#[must_use]
pub fn access_security(session: &SessionConfig) -> Bytes {
    DdmWriter::new(CodePoint::AccSec)
        .param_u16(param::SECMEC, session.security().code())
        .param(param::RDBNAM, session.rdb_name())
        .finish()
}

/// SECCHK: credentials for the negotiated mechanism.
pub fn security_check(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    let enc = session.encoding();
    let mut cmd = DdmWriter::new(CodePoint::SecChk)
        .param_u16(param::SECMEC, session.security().code())
        .param(param::RDBNAM, session.rdb_name())
        .param(param::USRID, &enc.encode(session.user())?);
    if session.security().code() == param::SECMEC_USRIDPWD {
        cmd = cmd.param(param::PASSWORD, &enc.encode(session.password())?);
    }
    Ok(cmd.finish())
}

fn type_definition_override(ccsids: &[(u16, u16)]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    for &(code_point, ccsid) in ccsids {
        put_object(&mut buf, code_point, &ccsid.to_be_bytes());
    }
    buf.to_vec()
}

fn access_database(
    session: &SessionConfig,
    product_id: &str,
    typdefnam: &str,
    ccsids: &[(u16, u16)],
) -> Result<Bytes, ProtocolError> {
    let enc = session.encoding();
    Ok(DdmWriter::new(CodePoint::AccRdb)
        .param(param::RDBNAM, session.rdb_name())
        .param_u16(param::RDBACCCL, param::SQLAM)
        .param(param::PRDID, &enc.encode(product_id)?)
        .param(param::TYPDEFNAM, &enc.encode(typdefnam)?)
        .param(param::CRRTKN, &enc.encode(CORRELATION_TOKEN)?)
        .param(param::TYPDEFOVR, &type_definition_override(ccsids))
        .finish())
}

/// ACCRDB for Derby: ASCII data type definitions, UTF-8 character data.
pub fn access_database_derby(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    access_database(
        session,
        "DNC10130",
        "QTDSQLASC",
        &[(param::CCSIDSBC, 1208), (param::CCSIDMBC, 1208)],
    )
}

/// ACCRDB for Db2: little-endian data type definitions, EBCDIC single-byte
/// data with UCS-2 and UTF-8 overrides.
pub fn access_database_db2(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    access_database(
        session,
        "JCC04200",
        "QTDSQLX86",
        &[
            (param::CCSIDSBC, 500),
            (param::CCSIDDBC, 1200),
            (param::CCSIDMBC, 1208),
        ],
    )
}

/// ACCRDB for the session's dialect.
pub fn access_database_for(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    match session.dialect() {
        Dialect::Derby => access_database_derby(session),
        Dialect::Db2 => access_database_db2(session),
    }
}

/// EXCSQLSET: set SQL environment.
pub fn set_sql_statement(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    Ok(DdmWriter::new(CodePoint::ExcSqlSet)
        .param(param::PKGNAMCSN, &package_name(session)?)
        .finish())
}

/// EXCSQLIMM: execute the following SQLSTT immediately.
pub fn execute_immediate(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    Ok(DdmWriter::new(CodePoint::ExcSqlImm)
        .param(param::PKGNAMCSN, &package_name(session)?)
        .param_u8(param::RDBCMTOK, param::TRUE)
        .finish())
}

/// PRPSQLSTT for Derby.
pub fn prepare_derby(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    Ok(DdmWriter::new(CodePoint::PrpSqlStt)
        .param(param::PKGNAMCSN, &package_name(session)?)
        .param_u8(param::RTNSQLDA, param::TRUE)
        .finish())
}

/// PRPSQLSTT for Db2, which also names the descriptor type.
pub fn prepare_db2(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    Ok(DdmWriter::new(CodePoint::PrpSqlStt)
        .param(param::PKGNAMCSN, &package_name(session)?)
        .param_u8(param::RTNSQLDA, param::TRUE)
        .param_u8(param::TYPSQLDA, TYPSQLDA_STANDARD_OUTPUT)
        .finish())
}

/// Nullable mixed string followed by a null single-byte string.
fn statement_object(session: &SessionConfig, code_point: CodePoint, text: &str) -> Bytes {
    let text = text.as_bytes();
    let mut body = BytesMut::with_capacity(text.len() + 6);
    body.put_u8(0x00);
    session.byte_order().put_u32(&mut body, text.len() as u32);
    body.put_slice(text);
    body.put_u8(0xFF);

    let mut out = BytesMut::with_capacity(body.len() + 4);
    put_object(&mut out, code_point.as_u16(), &body);
    out.freeze()
}

/// SQLSTT: SQL statement text (UTF-8).
#[must_use]
pub fn sql_statement(session: &SessionConfig, sql: &str) -> Bytes {
    statement_object(session, CodePoint::SqlStt, sql)
}

/// SQLATTR: statement attribute text such as `WITH HOLD `.
#[must_use]
pub fn sql_attributes(session: &SessionConfig, attributes: &str) -> Bytes {
    statement_object(session, CodePoint::SqlAttr, attributes)
}

fn open_query(session: &SessionConfig, dynamic_format: bool) -> Result<Bytes, ProtocolError> {
    let mut cmd = DdmWriter::new(CodePoint::OpnQry)
        .param(param::PKGNAMCSN, &package_name(session)?)
        .param_u32(param::QRYBLKSZ, QUERY_BLOCK_SIZE)
        .param_u16(param::MAXBLKEXT, 0xFFFF)
        .param_u8(param::QRYCLSIMP, QRYCLSIMP_YES);
    if dynamic_format {
        cmd = cmd.param_u8(param::DYNDTAFMT, param::TRUE);
    }
    Ok(cmd.finish())
}

/// OPNQRY for Derby.
pub fn open_query_derby(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    open_query(session, false)
}

/// OPNQRY for Db2, requesting dynamic data format.
pub fn open_query_db2(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    open_query(session, true)
}

/// DSCSQLSTT: describe the prepared statement.
pub fn describe_statement(session: &SessionConfig) -> Result<Bytes, ProtocolError> {
    Ok(DdmWriter::new(CodePoint::DscSqlStt)
        .param(param::PKGNAMCSN, &package_name(session)?)
        .param_u8(param::TYPSQLDA, TYPSQLDA_STANDARD_OUTPUT)
        .finish())
}

/// CLSQRY: close the query instance returned by OPNQRYRM.
pub fn close_query(session: &SessionConfig, query_instance: &[u8]) -> Result<Bytes, ProtocolError> {
    Ok(DdmWriter::new(CodePoint::ClsQry)
        .param(param::PKGNAMCSN, &package_name(session)?)
        .param(param::QRYINSID, query_instance)
        .finish())
}

/// RDBCMM: commit the unit of work.
#[must_use]
pub fn commit() -> Bytes {
    DdmWriter::new(CodePoint::RdbCmm).finish()
}
