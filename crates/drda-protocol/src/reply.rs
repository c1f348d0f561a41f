//! Reply object decoders.
//!
//! SQLCARD, SQLDARD and QRYDSC are FD:OCA-described data objects. Their
//! integers and length prefixes follow the session byte order; single-byte
//! strings use the session encoding and mixed strings are UTF-8.

use bytes::{Buf, Bytes};

use crate::codepoint::{CodePoint, param};
use crate::ddm::DdmObject;
use crate::encoding::{ByteOrder, Encoding};
use crate::error::ProtocolError;

/// Null indicator value marking an absent group.
const NULL_GROUP: u8 = 0xFF;

/// Triplet type of an FD:OCA row layout descriptor.
const ROW_LAYOUT_TRIPLET: u8 = 0x76;
/// Triplet identifier of an FD:OCA row layout descriptor.
const ROW_LAYOUT_ID: u8 = 0xD0;

/// Cursor over one FD:OCA object.
struct FieldReader {
    buf: Bytes,
    order: ByteOrder,
    encoding: Encoding,
    object: &'static str,
}

impl FieldReader {
    fn new(buf: Bytes, order: ByteOrder, encoding: Encoding, object: &'static str) -> Self {
        Self {
            buf,
            order,
            encoding,
            object,
        }
    }

    fn need(&self, n: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < n {
            return Err(ProtocolError::malformed(
                self.object,
                format!("needed {n} bytes, {} remain", self.buf.remaining()),
            ));
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn i16(&mut self) -> Result<i16, ProtocolError> {
        self.need(2)?;
        Ok(self.order.get_i16(&mut self.buf))
    }

    fn u16(&mut self) -> Result<u16, ProtocolError> {
        self.need(2)?;
        Ok(self.order.get_u16(&mut self.buf))
    }

    fn i32(&mut self) -> Result<i32, ProtocolError> {
        self.need(4)?;
        Ok(self.order.get_i32(&mut self.buf))
    }

    fn i64(&mut self) -> Result<i64, ProtocolError> {
        self.need(8)?;
        Ok(self.order.get_i64(&mut self.buf))
    }

    fn take(&mut self, n: usize) -> Result<Bytes, ProtocolError> {
        self.need(n)?;
        Ok(self.buf.split_to(n))
    }

    fn fixed_str(&mut self, n: usize) -> Result<String, ProtocolError> {
        let raw = self.take(n)?;
        Ok(self.encoding.decode(&raw))
    }

    /// Variable-length single-byte string.
    fn vcs(&mut self) -> Result<String, ProtocolError> {
        let len = self.u16()? as usize;
        let raw = self.take(len)?;
        Ok(self.encoding.decode(&raw))
    }

    /// Variable-length mixed string.
    fn vcm(&mut self) -> Result<String, ProtocolError> {
        let len = self.u16()? as usize;
        let raw = self.take(len)?;
        Ok(Encoding::Utf8.decode(&raw))
    }

    /// Mixed/single string pair; at most one is non-empty.
    fn vcm_vcs(&mut self) -> Result<String, ProtocolError> {
        let mixed = self.vcm()?;
        let single = self.vcs()?;
        Ok(if mixed.is_empty() { single } else { mixed })
    }

    /// Read a group null indicator; `true` when the group is present.
    fn group_present(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.u8()? != NULL_GROUP)
    }

    fn skip(&mut self, n: usize) -> Result<(), ProtocolError> {
        self.need(n)?;
        self.buf.advance(n);
        Ok(())
    }
}

/// SQL communications area reply data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SqlCard {
    /// SQLCODE: negative on error, positive on warning.
    pub code: i32,
    /// Five-character SQLSTATE.
    pub state: String,
    /// Server procedure that detected the condition.
    pub error_proc: String,
    /// SQLERRD diagnostic words.
    pub errd: [i32; 6],
    /// SQLWARN flags.
    pub warnings: [u8; 11],
    /// Database that produced the card.
    pub rdb_name: String,
    /// Message tokens.
    pub message: String,
}

impl SqlCard {
    /// Decode an SQLCARD object. Returns `None` for a null card.
    pub fn decode(
        data: Bytes,
        order: ByteOrder,
        encoding: Encoding,
    ) -> Result<Option<Self>, ProtocolError> {
        let mut reader = FieldReader::new(data, order, encoding, "SQLCARD");
        // a trailing diagnostics group carries nothing the client reads
        let (card, _diagnostics) = Self::read(&mut reader)?;
        Ok(card)
    }

    /// Read the card and the SQLDIAGGRP indicator that follows it.
    ///
    /// The second value is `true` when a diagnostics group is present; the
    /// reader is then left at the start of its unparsed body.
    fn read(r: &mut FieldReader) -> Result<(Option<Self>, bool), ProtocolError> {
        if !r.group_present()? {
            return Ok((None, false));
        }

        let mut card = Self {
            code: r.i32()?,
            state: r.fixed_str(5)?,
            error_proc: r.fixed_str(8)?,
            ..Self::default()
        };

        if r.group_present()? {
            for word in &mut card.errd {
                *word = r.i32()?;
            }
            let warn = r.take(11)?;
            card.warnings.copy_from_slice(&warn);
            card.rdb_name = r.vcs()?.trim_end().to_string();
            card.message = r.vcm_vcs()?;
        }

        // SQLDIAGGRP; absent at the end of a standalone card
        let diagnostics = !r.buf.is_empty() && r.group_present()?;

        Ok((Some(card), diagnostics))
    }

    /// Whether the card reports an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code < 0
    }

    /// Whether the card reports a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.code > 0
    }

    /// Rows affected by the statement (SQLERRD\[2\]).
    #[must_use]
    pub fn update_count(&self) -> i32 {
        self.errd[2]
    }
}

/// Metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Column label, when different from the name.
    pub label: String,
    /// SQLTYPE code; odd values are nullable.
    pub sql_type: i16,
    /// Declared length in bytes.
    pub length: i64,
    /// Decimal precision.
    pub precision: i16,
    /// Decimal scale.
    pub scale: i16,
    /// Character set of the column data.
    pub ccsid: u16,
    /// Schema of the base table.
    pub schema: Option<String>,
    /// Base table name.
    pub base_table: Option<String>,
}

impl ColumnDescriptor {
    /// Whether the column may hold NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.sql_type & 1 == 1
    }

    /// SQL type name of the column.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        sql_type_name(self.sql_type)
    }

    fn read(r: &mut FieldReader) -> Result<Self, ProtocolError> {
        let mut col = Self {
            precision: r.i16()?,
            scale: r.i16()?,
            length: r.i64()?,
            sql_type: r.i16()?,
            ccsid: r.u16()?,
            ..Self::default()
        };

        // SQLDOPTGRP
        if r.group_present()? {
            let _unnamed = r.i16()?;
            col.name = r.vcm_vcs()?;
            col.label = r.vcm_vcs()?;
            let _comments = r.vcm_vcs()?;
        }

        // SQLUDTGRP
        if r.group_present()? {
            let _udt_type = r.i32()?;
            let _udt_rdb = r.vcs()?;
            let _udt_schema = r.vcm_vcs()?;
            let _udt_name = r.vcm_vcs()?;
        }

        // SQLDXGRP
        if r.group_present()? {
            r.skip(8)?; // keymem, updatable, generated, parmmode
            let _rdb = r.vcs()?;
            let _correlation = r.vcm_vcs()?;
            let base = r.vcm_vcs()?;
            let schema = r.vcm_vcs()?;
            let _xname = r.vcm_vcs()?;
            col.base_table = Some(base).filter(|s| !s.is_empty());
            col.schema = Some(schema.trim_end().to_string()).filter(|s| !s.is_empty());
        }

        Ok(col)
    }
}

/// SQL type name for an SQLTYPE code.
#[must_use]
pub fn sql_type_name(sql_type: i16) -> &'static str {
    match sql_type & !1 {
        384 => "DATE",
        388 => "TIME",
        392 => "TIMESTAMP",
        404 => "BLOB",
        408 => "CLOB",
        448 => "VARCHAR",
        452 => "CHAR",
        456 => "LONG VARCHAR",
        480 => "DOUBLE",
        484 => "DECIMAL",
        492 => "BIGINT",
        496 => "INTEGER",
        500 => "SMALLINT",
        908 => "VARBINARY",
        912 => "BINARY",
        2436 => "BOOLEAN",
        _ => "UNKNOWN",
    }
}

/// SQL descriptor area reply data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDard {
    /// Leading completion card.
    pub card: Option<SqlCard>,
    /// Column descriptors; empty when the card reports an error.
    pub columns: Vec<ColumnDescriptor>,
}

impl SqlDard {
    /// Decode an SQLDARD object.
    ///
    /// Column descriptors are only decoded when the leading card does not
    /// report an error. A card followed by a diagnostics group also yields
    /// no descriptors, since the group's body is not parsed.
    pub fn decode(data: Bytes, order: ByteOrder, encoding: Encoding) -> Result<Self, ProtocolError> {
        let mut r = FieldReader::new(data, order, encoding, "SQLDARD");
        let (card, diagnostics) = SqlCard::read(&mut r)?;
        if diagnostics || card.as_ref().is_some_and(SqlCard::is_error) {
            return Ok(Self {
                card,
                columns: Vec::new(),
            });
        }

        // SQLDHGRP
        if r.group_present()? {
            r.skip(12)?; // hold, return, scroll, sensitive, fcode, keytype
            let _rdb = r.vcs()?;
            let _schema = r.vcm_vcs()?;
        }

        let count = r.i16()?.max(0) as usize;
        let mut columns = Vec::with_capacity(count);
        for _ in 0..count {
            columns.push(ColumnDescriptor::read(&mut r)?);
        }
        Ok(Self { card, columns })
    }
}

/// One (type tag, size spec) pair of a query descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// FD:OCA type tag.
    pub tag: u8,
    /// Two-byte size specification.
    pub size: [u8; 2],
}

impl FieldDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub const fn new(tag: u8, size: [u8; 2]) -> Self {
        Self { tag, size }
    }

    /// Size spec read as a big-endian length.
    #[must_use]
    pub const fn length(&self) -> u16 {
        u16::from_be_bytes(self.size)
    }

    /// Decimal precision (first size byte).
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.size[0]
    }

    /// Decimal scale (second size byte).
    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.size[1]
    }
}

/// Row layout of a result set, one descriptor per column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryDescriptor {
    /// Column field descriptors in column order.
    pub fields: Vec<FieldDescriptor>,
}

impl QueryDescriptor {
    /// Decode a QRYDSC object.
    ///
    /// The object opens with a row-layout triplet (`LL 0x76 0xD0`) whose
    /// body is a list of 3-byte (tag, size) entries. Consecutive row-layout
    /// triplets extend the list; any other triplet ends it.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let mut fields = Vec::new();
        let mut pos = 0usize;
        let mut first = true;

        while pos < data.len() {
            let len = data[pos] as usize;
            if len < 3 || pos + len > data.len() {
                return Err(ProtocolError::malformed(
                    "QRYDSC",
                    format!("triplet length {len} at offset {pos}"),
                ));
            }
            let (kind, id) = (data[pos + 1], data[pos + 2]);
            if kind != ROW_LAYOUT_TRIPLET || id != ROW_LAYOUT_ID {
                if first {
                    return Err(ProtocolError::malformed(
                        "QRYDSC",
                        format!("expected row layout marker, found {kind:02X} {id:02X}"),
                    ));
                }
                break;
            }
            for entry in data[pos + 3..pos + len].chunks_exact(3) {
                fields.push(FieldDescriptor::new(entry[0], [entry[1], entry[2]]));
            }
            pos += len;
            first = false;
        }

        if first {
            return Err(ProtocolError::malformed("QRYDSC", "empty descriptor"));
        }
        Ok(Self { fields })
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the descriptor has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A reply message collection (an `*RM` object).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    /// Which reply message this is.
    pub code_point: CodePoint,
    /// Severity code (SVRCOD), when present.
    pub severity: Option<u16>,
    /// Server diagnostic text (SRVDGN), when present.
    pub diagnostic: Option<String>,
    /// Security check code (SECCHKCD), when present.
    pub security_check_code: Option<u8>,
    /// Query instance id (QRYINSID), when present.
    pub query_instance: Option<Bytes>,
}

impl ReplyMessage {
    /// Extract the interesting parameters of a reply message.
    #[must_use]
    pub fn from_object(obj: &DdmObject) -> Self {
        Self {
            code_point: obj.kind(),
            severity: obj.param_u16(param::SVRCOD),
            diagnostic: obj
                .find_param(param::SRVDGN)
                .map(|d| Encoding::Utf8.decode(&d)),
            security_check_code: obj.find_param(param::SECCHKCD).and_then(|d| d.first().copied()),
            query_instance: obj.find_param(param::QRYINSID),
        }
    }

    /// Whether this message reports a failure of the request.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self.code_point {
            CodePoint::SecChkRm => self.security_check_code.is_some_and(|c| c != 0),
            cp if cp.is_error_reply() => self.severity.unwrap_or(0) >= param::SVRCOD_ERROR,
            _ => false,
        }
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.diagnostic, self.security_check_code) {
            (Some(text), _) if !text.is_empty() => text.clone(),
            (_, Some(code)) if self.code_point == CodePoint::SecChkRm => {
                format!("security check failed with code 0x{code:02X}")
            }
            _ => format!("{} reply", self.code_point),
        }
    }
}

/// Rest of a QRYDTA buffer after consuming a row sentinel, or `None` when
/// the next two bytes are not the `0xFF 0x00` pair.
#[must_use]
pub fn strip_row_sentinel(buf: &Bytes) -> Option<Bytes> {
    match buf.as_ref() {
        [0xFF, 0x00, ..] => Some(buf.slice(2..)),
        _ => None,
    }
}
