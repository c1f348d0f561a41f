//! Encoders for server reply chains.
//!
//! [`ReplyBuilder`] produces the bytes a DRDA server would send: reply
//! messages, SQLCARD/SQLDARD reply data and query descriptors and rows, each
//! framed in its own DSS unit (or grouped) with every unit but the last
//! chained. Numbers and length prefixes follow the dialect's byte order and
//! strings its encoding, matching the client-side decoders.

use bytes::{BufMut, Bytes, BytesMut};
use drda_protocol::codepoint::param;
use drda_protocol::ddm::put_object;
use drda_protocol::{
    CodePoint, DdmWriter, Dialect, DrdaType, DssFlags, DssType, DssUnit, ProtocolError,
};
use drda_types::{SqlValue, TypeError, TypeInfo, ValueFormat, encode_value};
use thiserror::Error;

/// Query instance id returned by [`ReplyBuilder::open_query`] by default.
pub const QUERY_INSTANCE: [u8; 8] = [0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2A];

/// Database name placed in reply cards.
const MOCK_RDB: &str = "MOCKDB";

/// Trailing FD:OCA triplet sent after the row layout in QRYDSC.
const QRYDSC_TRAILER: [u8; 6] = [0x06, 0x71, 0xE4, 0xD0, 0x00, 0x01];

/// Row layout entries that fit one triplet (its length is a single byte).
const FIELDS_PER_TRIPLET: usize = 84;

/// Error produced while encoding replies.
#[derive(Debug, Error)]
pub enum MockError {
    /// A string could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A value could not be encoded.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

/// Contents of an SQLCARD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCard {
    /// SQLCODE.
    pub code: i32,
    /// SQLSTATE.
    pub state: String,
    /// Message tokens.
    pub message: String,
    /// Rows affected (SQLERRD\[2\]).
    pub update_count: i32,
    /// Send a non-null SQLDIAGGRP after the card.
    pub diagnostics: bool,
}

impl MockCard {
    /// Successful completion.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: 0,
            state: "00000".into(),
            message: String::new(),
            update_count: 0,
            diagnostics: false,
        }
    }

    /// Successful completion affecting `count` rows.
    #[must_use]
    pub fn updated(count: i32) -> Self {
        Self {
            update_count: count,
            ..Self::ok()
        }
    }

    /// End of data (SQLCODE +100).
    #[must_use]
    pub fn end_of_data() -> Self {
        Self {
            code: 100,
            state: "02000".into(),
            ..Self::ok()
        }
    }

    /// A failing card.
    #[must_use]
    pub fn error(code: i32, state: &str, message: &str) -> Self {
        Self {
            code,
            state: state.into(),
            message: message.into(),
            update_count: 0,
            diagnostics: false,
        }
    }

    /// Follow the card with a present diagnostics group.
    #[must_use]
    pub fn with_diagnostics(mut self) -> Self {
        self.diagnostics = true;
        self
    }
}

/// A result column: SQLDARD metadata plus its QRYDSC layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockColumn {
    /// Column name.
    pub name: String,
    /// SQLTYPE code.
    pub sql_type: i16,
    /// Declared length.
    pub length: i64,
    /// Decimal precision.
    pub precision: i16,
    /// Decimal scale.
    pub scale: i16,
    /// Wire layout of the column's values.
    pub info: TypeInfo,
}

impl MockColumn {
    fn new(name: &str, sql_type: i16, length: i64, info: TypeInfo) -> Self {
        Self {
            name: name.into(),
            sql_type,
            length,
            precision: 0,
            scale: 0,
            info,
        }
    }

    /// INTEGER column.
    #[must_use]
    pub fn integer(name: &str) -> Self {
        Self::new(name, 496, 4, TypeInfo::new(DrdaType::Integer, 4))
    }

    /// SMALLINT column.
    #[must_use]
    pub fn smallint(name: &str) -> Self {
        Self::new(name, 500, 2, TypeInfo::new(DrdaType::SmallInt, 2))
    }

    /// BIGINT column.
    #[must_use]
    pub fn bigint(name: &str) -> Self {
        Self::new(name, 492, 8, TypeInfo::new(DrdaType::BigInt, 8))
    }

    /// DOUBLE column.
    #[must_use]
    pub fn double(name: &str) -> Self {
        Self::new(name, 480, 8, TypeInfo::new(DrdaType::Float8, 8))
    }

    /// BOOLEAN column.
    #[must_use]
    pub fn boolean(name: &str) -> Self {
        Self::new(name, 2436, 1, TypeInfo::new(DrdaType::Boolean, 1))
    }

    /// VARCHAR column of at most `max` bytes.
    #[must_use]
    pub fn varchar(name: &str, max: u16) -> Self {
        Self::new(name, 448, i64::from(max), TypeInfo::new(DrdaType::VarChar, max))
    }

    /// CHAR column of exactly `width` bytes.
    #[must_use]
    pub fn char(name: &str, width: u16) -> Self {
        Self::new(name, 452, i64::from(width), TypeInfo::new(DrdaType::Char, width))
    }

    /// VARCHAR FOR BIT DATA column.
    #[must_use]
    pub fn varbinary(name: &str, max: u16) -> Self {
        Self::new(name, 908, i64::from(max), TypeInfo::new(DrdaType::VarBytes, max))
    }

    /// DECIMAL column.
    #[must_use]
    pub fn decimal(name: &str, precision: u8, scale: u8) -> Self {
        Self {
            precision: i16::from(precision),
            scale: i16::from(scale),
            ..Self::new(name, 484, 0, TypeInfo::decimal(precision, scale))
        }
    }

    /// DATE column.
    #[must_use]
    pub fn date(name: &str) -> Self {
        Self::new(name, 384, 10, TypeInfo::new(DrdaType::Date, 10))
    }

    /// TIME column.
    #[must_use]
    pub fn time(name: &str) -> Self {
        Self::new(name, 388, 8, TypeInfo::new(DrdaType::Time, 8))
    }

    /// TIMESTAMP column with microsecond text.
    #[must_use]
    pub fn timestamp(name: &str) -> Self {
        Self::new(name, 392, 26, TypeInfo::new(DrdaType::Timestamp, 26))
    }

    /// Make the column nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.sql_type |= 1;
        self.info = self.info.nullable();
        self
    }
}

struct ReplyObject {
    dss_type: DssType,
    correlation_id: u16,
    bytes: Bytes,
}

/// Builder for one server reply chain.
pub struct ReplyBuilder {
    format: ValueFormat,
    objects: Vec<ReplyObject>,
    layout: Vec<TypeInfo>,
    correlation_id: u16,
    error: Option<MockError>,
}

impl ReplyBuilder {
    /// Start a chain encoded the way `dialect` servers encode replies.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self::with_format(ValueFormat::new(dialect.encoding(), dialect.byte_order()))
    }

    /// Start a chain with an explicit value format.
    #[must_use]
    pub fn with_format(format: ValueFormat) -> Self {
        Self {
            format,
            objects: Vec::new(),
            layout: Vec::new(),
            correlation_id: 1,
            error: None,
        }
    }

    /// Correlation id for the objects added after this call.
    #[must_use]
    pub fn correlation(mut self, id: u16) -> Self {
        self.correlation_id = id;
        self
    }

    fn push(mut self, dss_type: DssType, bytes: Bytes) -> Self {
        self.objects.push(ReplyObject {
            dss_type,
            correlation_id: self.correlation_id,
            bytes,
        });
        self
    }

    fn push_data(self, code_point: CodePoint, result: Result<BytesMut, MockError>) -> Self {
        match result {
            Ok(data) => {
                let mut obj = BytesMut::with_capacity(data.len() + 8);
                put_object(&mut obj, code_point.into(), &data);
                self.push(DssType::Object, obj.freeze())
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(mut self, error: MockError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    /// Append an arbitrary encoded object.
    #[must_use]
    pub fn object(self, dss_type: DssType, code_point: CodePoint, data: &[u8]) -> Self {
        let mut obj = BytesMut::new();
        put_object(&mut obj, code_point.into(), data);
        self.push(dss_type, obj.freeze())
    }

    /// Append a reply message carrying only a severity code.
    #[must_use]
    pub fn reply_message(self, code_point: CodePoint, severity: u16) -> Self {
        let rm = DdmWriter::new(code_point)
            .param_u16(param::SVRCOD, severity)
            .finish();
        self.push(DssType::Reply, rm)
    }

    /// Append EXCSATRD.
    #[must_use]
    pub fn server_attributes(self) -> Self {
        let rd = DdmWriter::new(CodePoint::ExcSatRd)
            .param(param::SRVCLSNM, b"MOCK")
            .param(param::SRVRLSLV, b"MCK01000")
            .finish();
        self.push(DssType::Reply, rd)
    }

    /// Append ACCSECRD echoing `secmec`.
    #[must_use]
    pub fn access_security(self, secmec: u16) -> Self {
        let rd = DdmWriter::new(CodePoint::AccSecRd)
            .param_u16(param::SECMEC, secmec)
            .finish();
        self.push(DssType::Reply, rd)
    }

    /// Append SECCHKRM with a security check code; zero means success.
    #[must_use]
    pub fn security_check(self, code: u8) -> Self {
        let severity = if code == 0 { 0 } else { param::SVRCOD_ERROR };
        let rm = DdmWriter::new(CodePoint::SecChkRm)
            .param_u16(param::SVRCOD, severity)
            .param_u8(param::SECCHKCD, code)
            .finish();
        self.push(DssType::Reply, rm)
    }

    /// Append ACCRDBRM.
    #[must_use]
    pub fn access_database(self) -> Self {
        let rm = DdmWriter::new(CodePoint::AccRdbRm)
            .param_u16(param::SVRCOD, 0)
            .param(param::PRDID, b"MCK01000")
            .finish();
        self.push(DssType::Reply, rm)
    }

    /// Append SQLERRRM with diagnostic text.
    #[must_use]
    pub fn sql_error_message(self, text: &str) -> Self {
        let rm = DdmWriter::new(CodePoint::SqlErrRm)
            .param_u16(param::SVRCOD, param::SVRCOD_ERROR)
            .param(param::SRVDGN, text.as_bytes())
            .finish();
        self.push(DssType::Reply, rm)
    }

    /// Append OPNQRYRM with the default query instance.
    #[must_use]
    pub fn open_query(self) -> Self {
        self.open_query_with(&QUERY_INSTANCE)
    }

    /// Append OPNQRYRM with `query_instance`.
    #[must_use]
    pub fn open_query_with(self, query_instance: &[u8]) -> Self {
        let rm = DdmWriter::new(CodePoint::OpnQryRm)
            .param_u16(param::SVRCOD, 0)
            .param_u16(param::QRYPRCTYP, 0x2418)
            .param(param::QRYINSID, query_instance)
            .finish();
        self.push(DssType::Reply, rm)
    }

    /// Append ENDQRYRM.
    #[must_use]
    pub fn end_query(self) -> Self {
        self.reply_message(CodePoint::EndQryRm, 4)
    }

    /// Append ENDUOWRM.
    #[must_use]
    pub fn end_unit_of_work(self) -> Self {
        self.reply_message(CodePoint::EndUowRm, 4)
    }

    /// Append RDBUPDRM.
    #[must_use]
    pub fn database_updated(self) -> Self {
        self.reply_message(CodePoint::RdbUpdRm, 0)
    }

    /// Append an SQLCARD.
    #[must_use]
    pub fn sqlcard(self, card: MockCard) -> Self {
        let result = encode_card(&card, self.format);
        self.push_data(CodePoint::SqlCard, result)
    }

    /// Append a null SQLCARD.
    #[must_use]
    pub fn null_sqlcard(self) -> Self {
        self.push_data(CodePoint::SqlCard, Ok(BytesMut::from(&[0xFFu8][..])))
    }

    /// Append an SQLDARD describing `columns`.
    #[must_use]
    pub fn sqldard(self, card: MockCard, columns: &[MockColumn]) -> Self {
        let result = encode_dard(&card, columns, self.format);
        self.push_data(CodePoint::SqlDard, result)
    }

    /// Append a QRYDSC for `layout` and make it the active row layout.
    #[must_use]
    pub fn query_descriptor(mut self, layout: &[TypeInfo]) -> Self {
        self.layout = layout.to_vec();
        let mut buf = BytesMut::new();
        for chunk in layout.chunks(FIELDS_PER_TRIPLET) {
            buf.put_u8((3 + chunk.len() * 3) as u8);
            buf.put_slice(&[0x76, 0xD0]);
            for info in chunk {
                buf.put_u8(info.tag());
                buf.put_u16(info.length);
            }
        }
        buf.put_slice(&QRYDSC_TRAILER);
        self.push_data(CodePoint::QryDsc, Ok(buf))
    }

    /// Append a QRYDSC for the layout of `columns`.
    #[must_use]
    pub fn query_descriptor_for(self, columns: &[MockColumn]) -> Self {
        let layout: Vec<TypeInfo> = columns.iter().map(|c| c.info).collect();
        self.query_descriptor(&layout)
    }

    /// Append a QRYDTA with `rows`, encoded with the active row layout.
    #[must_use]
    pub fn query_data(self, rows: &[Vec<SqlValue>]) -> Self {
        let result = encode_rows(&self.layout, rows, self.format);
        self.push_data(CodePoint::QryDta, result)
    }

    /// Append a QRYDTA with raw content.
    #[must_use]
    pub fn query_data_raw(self, data: &[u8]) -> Self {
        self.push_data(CodePoint::QryDta, Ok(BytesMut::from(data)))
    }

    /// Frame every object in its own unit.
    pub fn build(self) -> Result<Vec<u8>, MockError> {
        self.build_grouped(1)
    }

    /// Frame `per_unit` consecutive objects per unit.
    pub fn build_grouped(self, per_unit: usize) -> Result<Vec<u8>, MockError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let groups: Vec<&[ReplyObject]> = self.objects.chunks(per_unit.max(1)).collect();
        let mut out = Vec::new();
        for (i, group) in groups.iter().enumerate() {
            let flags = if i + 1 < groups.len() {
                DssFlags::CHAINED
            } else {
                DssFlags::empty()
            };
            let first = &group[0];
            let payload: Vec<u8> = group.iter().flat_map(|o| o.bytes.iter().copied()).collect();
            out.extend_from_slice(&DssUnit::frame(
                first.dss_type,
                flags,
                first.correlation_id,
                &payload,
            ));
        }
        Ok(out)
    }
}

fn encode_card(card: &MockCard, format: ValueFormat) -> Result<BytesMut, MockError> {
    let mut buf = BytesMut::new();
    put_card(&mut buf, card, format)?;
    if card.diagnostics {
        // SQLDIAGGRP: indicator plus an opaque statement-diagnostics body
        buf.put_u8(0x00);
        buf.put_slice(&[0u8; 8]);
    } else {
        buf.put_u8(0xFF);
    }
    Ok(buf)
}

fn encode_dard(
    card: &MockCard,
    columns: &[MockColumn],
    format: ValueFormat,
) -> Result<BytesMut, MockError> {
    let mut buf = encode_card(card, format)?;
    buf.put_u8(0xFF); // SQLDHGRP
    let count = i16::try_from(columns.len())
        .map_err(|_| TypeError::OutOfRange { target_type: "SQLNUM" })?;
    format.byte_order.put_i16(&mut buf, count);
    for column in columns {
        put_column(&mut buf, column, format);
    }
    Ok(buf)
}

fn encode_rows(
    layout: &[TypeInfo],
    rows: &[Vec<SqlValue>],
    format: ValueFormat,
) -> Result<BytesMut, MockError> {
    let mut buf = BytesMut::new();
    for row in rows {
        if row.len() != layout.len() {
            return Err(TypeError::ParameterCount {
                expected: layout.len(),
                actual: row.len(),
            }
            .into());
        }
        buf.put_slice(&[0xFF, 0x00]);
        for (value, info) in row.iter().zip(layout) {
            encode_value(value, info, format, &mut buf)?;
        }
    }
    Ok(buf)
}

fn put_vcs(buf: &mut BytesMut, format: ValueFormat, raw: &[u8]) {
    format.byte_order.put_u16(buf, raw.len() as u16);
    buf.put_slice(raw);
}

/// Write a mixed string and an empty single-byte string.
fn put_vcm_vcs(buf: &mut BytesMut, format: ValueFormat, text: &str) {
    put_vcs(buf, format, text.as_bytes());
    put_vcs(buf, format, &[]);
}

fn put_card(buf: &mut BytesMut, card: &MockCard, format: ValueFormat) -> Result<(), MockError> {
    let encoding = format.encoding;
    let order = format.byte_order;

    buf.put_u8(0x00);
    order.put_i32(buf, card.code);
    buf.put_slice(&encoding.encode_fixed(&card.state, 5)?);
    buf.put_slice(&encoding.encode_fixed("SQLMOCK", 8)?);

    if card.message.is_empty() && card.update_count == 0 {
        buf.put_u8(0xFF);
        return Ok(());
    }
    buf.put_u8(0x00);
    for word in [0, 0, card.update_count, 0, 0, 0] {
        order.put_i32(buf, word);
    }
    buf.put_slice(&encoding.encode_fixed("", 11)?);
    put_vcs(buf, format, &encoding.encode(MOCK_RDB)?);
    put_vcm_vcs(buf, format, &card.message);
    Ok(())
}

fn put_column(buf: &mut BytesMut, column: &MockColumn, format: ValueFormat) {
    let order = format.byte_order;
    order.put_i16(buf, column.precision);
    order.put_i16(buf, column.scale);
    order.put_i64(buf, column.length);
    order.put_i16(buf, column.sql_type);
    let ccsid = match column.info.drda_type {
        DrdaType::Char | DrdaType::VarChar | DrdaType::LongVarChar => format.encoding.ccsid(),
        DrdaType::Mixed | DrdaType::VarMixed | DrdaType::LongMixed => 1208,
        _ => 0,
    };
    order.put_u16(buf, ccsid);

    // SQLDOPTGRP
    buf.put_u8(0x00);
    order.put_i16(buf, 0);
    put_vcm_vcs(buf, format, &column.name);
    put_vcm_vcs(buf, format, "");
    put_vcm_vcs(buf, format, "");
    // SQLUDTGRP, SQLDXGRP
    buf.put_u8(0xFF);
    buf.put_u8(0xFF);
}
