//! Reply chain parsing.
//!
//! A request group is answered by a chain of DSS units. The parser walks the
//! DDM objects of each unit in order and folds them into one [`Response`]:
//!
//! ```text
//! AwaitUnit --feed(chained unit)--> AwaitUnit
//! AwaitUnit --feed(last unit)-----> Done
//! ```
//!
//! SQL and server errors are captured rather than returned, so the whole
//! chain is always consumed. Only malformed data aborts parsing.

use std::io::Read;

use bytes::Bytes;
use drda_codec::read_chain;
use drda_protocol::reply::strip_row_sentinel;
use drda_protocol::{
    CodePoint, ColumnDescriptor, DdmObject, DssUnit, ProtocolError, QueryDescriptor, ReplyMessage,
    SessionConfig, SqlCard, SqlDard,
};
use drda_types::{SqlValue, TypeInfo, ValueFormat, decode_row};

use crate::error::{Error, Result};
use crate::row::{Column, ResultSet};

/// SQLCODE reported when a cursor has no more rows.
const END_OF_DATA: i32 = 100;

/// Parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for the next unit of the chain.
    AwaitUnit,
    /// An unchained unit has been consumed.
    Done,
}

/// Everything one reply chain carried.
#[derive(Debug, Default)]
pub struct Response {
    /// Column descriptors from the last SQLDARD.
    pub columns: Vec<ColumnDescriptor>,
    /// Row layout from the last QRYDSC.
    pub layout: Vec<TypeInfo>,
    /// Decoded rows in arrival order.
    pub rows: Vec<Vec<SqlValue>>,
    /// Rows affected, from the last SQLCARD reporting a non-zero count.
    pub update_count: Option<u64>,
    /// Query instance id from OPNQRYRM.
    pub query_instance: Option<Bytes>,
    /// First SQL or server error in the chain.
    pub error: Option<Error>,
}

impl Response {
    /// Surface the captured error, discarding any rows.
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Whether an error was captured.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Convert the rows into a [`ResultSet`].
    ///
    /// Column metadata comes from the SQLDARD when it matches the row
    /// layout, otherwise placeholder columns are derived from the layout.
    #[must_use]
    pub fn into_result_set(self) -> ResultSet {
        let described = !self.columns.is_empty()
            && (self.layout.is_empty() || self.columns.len() == self.layout.len());
        let columns = if described {
            self.columns
                .iter()
                .enumerate()
                .map(|(i, c)| Column::from_descriptor(i, c))
                .collect()
        } else {
            self.layout
                .iter()
                .enumerate()
                .map(|(i, info)| Column::from_layout(i, info))
                .collect()
        };
        ResultSet::new(columns, self.rows)
    }
}

/// Folds the units of one reply chain into a [`Response`].
#[derive(Debug)]
pub struct ResponseParser {
    format: ValueFormat,
    state: ParserState,
    layout: Option<Vec<TypeInfo>>,
    error_message: Option<String>,
    response: Response,
}

impl ResponseParser {
    /// Create a parser decoding with `format`.
    #[must_use]
    pub fn new(format: ValueFormat) -> Self {
        Self {
            format,
            state: ParserState::AwaitUnit,
            layout: None,
            error_message: None,
            response: Response::default(),
        }
    }

    /// Create a parser for a session's encoding and byte order.
    #[must_use]
    pub fn for_session(session: &SessionConfig) -> Self {
        Self::new(ValueFormat::for_session(session))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Whether the final unit of the chain has been fed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Dispatch every object of one unit.
    pub fn feed(&mut self, unit: &DssUnit) -> Result<()> {
        if self.is_done() {
            return Err(
                ProtocolError::malformed("DSS", "unit received after the end of the chain").into(),
            );
        }
        for object in unit.objects() {
            self.dispatch(&object?)?;
        }
        if !unit.is_chained() {
            self.state = ParserState::Done;
        }
        Ok(())
    }

    /// Finish parsing and return what the chain carried.
    #[must_use]
    pub fn finish(mut self) -> Response {
        if let Some(layout) = self.layout.take() {
            self.response.layout = layout;
        }
        tracing::trace!(
            rows = self.response.rows.len(),
            columns = self.response.columns.len(),
            error = self.response.error.is_some(),
            "reply chain parsed"
        );
        self.response
    }

    fn dispatch(&mut self, obj: &DdmObject) -> Result<()> {
        let order = self.format.byte_order;
        let encoding = self.format.encoding;

        match obj.kind() {
            CodePoint::SqlErrRm => {
                let rm = ReplyMessage::from_object(obj);
                if self.error_message.is_none() {
                    self.error_message = rm.diagnostic.filter(|d| !d.is_empty());
                }
            }
            CodePoint::SqlCard => {
                let card = SqlCard::decode(obj.data.clone(), order, encoding)?;
                self.handle_card(card.as_ref());
            }
            CodePoint::SqlDard => {
                let dard = SqlDard::decode(obj.data.clone(), order, encoding)?;
                self.handle_card(dard.card.as_ref());
                if !dard.card.as_ref().is_some_and(SqlCard::is_error) {
                    self.response.columns = dard.columns;
                }
            }
            CodePoint::QryDsc => {
                let descriptor = QueryDescriptor::decode(&obj.data)?;
                let layout = descriptor
                    .fields
                    .iter()
                    .map(TypeInfo::from_field)
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                tracing::trace!(columns = layout.len(), "query descriptor");
                self.layout = Some(layout);
            }
            CodePoint::QryDta => self.decode_rows(&obj.data)?,
            CodePoint::OpnQryRm => {
                let rm = ReplyMessage::from_object(obj);
                if rm.query_instance.is_some() {
                    self.response.query_instance = rm.query_instance;
                }
            }
            CodePoint::QryNopRm | CodePoint::QryPopRm => {
                let rm = ReplyMessage::from_object(obj);
                tracing::debug!(code_point = %rm.code_point, severity = ?rm.severity, "query state reply");
            }
            cp if cp == CodePoint::SecChkRm || cp.is_error_reply() => {
                let rm = ReplyMessage::from_object(obj);
                if rm.is_failure() {
                    self.capture(Error::Server {
                        code_point: rm.code_point,
                        severity: rm.severity.unwrap_or_default(),
                        message: rm.describe(),
                    });
                }
            }
            CodePoint::Unknown(value) => {
                tracing::warn!(code_point = format_args!("0x{value:04X}"), "unknown reply object");
            }
            other => {
                tracing::trace!(code_point = %other, len = obj.data.len(), "reply object");
            }
        }
        Ok(())
    }

    fn handle_card(&mut self, card: Option<&SqlCard>) {
        let Some(card) = card else {
            return;
        };

        if card.is_error() {
            let message = self
                .error_message
                .clone()
                .or_else(|| Some(card.message.trim().to_string()).filter(|m| !m.is_empty()))
                .unwrap_or_else(|| format!("statement failed with SQLCODE {}", card.code));
            self.capture(Error::Sql {
                code: card.code,
                state: card.state.clone(),
                message,
            });
            return;
        }

        if card.code == END_OF_DATA {
            tracing::debug!("end of data");
        } else if card.is_warning() {
            tracing::warn!(sql_code = card.code, sql_state = %card.state, "SQL warning");
        }

        match u64::try_from(card.update_count()) {
            Ok(count) if count > 0 => self.response.update_count = Some(count),
            _ => {}
        }
    }

    fn decode_rows(&mut self, data: &Bytes) -> Result<()> {
        let Some(layout) = self.layout.as_deref() else {
            return Err(
                ProtocolError::malformed("QRYDTA", "row data without a query descriptor").into(),
            );
        };

        let mut buf = data.clone();
        while let Some(rest) = strip_row_sentinel(&buf) {
            buf = rest;
            let row = decode_row(&mut buf, layout, self.format)?;
            self.response.rows.push(row);
        }
        if !buf.is_empty() {
            tracing::trace!(remaining = buf.len(), "row data ends without a sentinel");
        }
        Ok(())
    }

    fn capture(&mut self, err: Error) {
        if self.response.error.is_none() {
            tracing::debug!(error = %err, "captured reply error");
            self.response.error = Some(err);
        } else {
            tracing::debug!(error = %err, "ignoring reply error after the first");
        }
    }
}

/// Read one reply chain and parse it.
///
/// The whole chain is read before any object is decoded, so a decoding
/// failure never leaves unread units on the stream.
pub fn read_response(stream: &mut impl Read, session: &SessionConfig) -> Result<Response> {
    let units = read_chain(stream)?;
    parse_chain(&units, session)
}

/// Parse an already-read reply chain.
pub fn parse_chain(units: &[DssUnit], session: &SessionConfig) -> Result<Response> {
    let mut parser = ResponseParser::for_session(session);
    for unit in units {
        parser.feed(unit)?;
    }
    Ok(parser.finish())
}
