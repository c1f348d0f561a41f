//! # drda-protocol
//!
//! Pure implementation of the DRDA (Distributed Relational Database
//! Architecture) wire protocol as spoken by Apache Derby and IBM Db2.
//!
//! This crate provides DSS framing, the DDM object layer, the code point
//! table, command payload builders and decoders for the reply objects a
//! client receives (SQLCARD, SQLDARD, QRYDSC and reply messages).
//!
//! ## Design Philosophy
//!
//! This crate is intentionally IO-agnostic. It contains no networking logic;
//! `drda-codec` reads and writes DSS units over a byte stream and
//! `drda-client` drives the conversation.
//!
//! ## Example
//!
//! ```rust
//! use drda_protocol::{command, Dialect, SessionConfig};
//!
//! let session = SessionConfig::new(Dialect::Derby, "testdb", None, None).unwrap();
//! let payload = command::access_security(&session);
//! assert_eq!(&payload[2..4], &[0x10, 0x6D]);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codepoint;
pub mod command;
pub mod ddm;
pub mod dss;
pub mod encoding;
pub mod error;
pub mod reply;
pub mod session;
pub mod types;

pub use codepoint::CodePoint;
pub use ddm::{DdmObject, DdmWriter, Objects};
pub use dss::{DSS_HEADER_SIZE, DSS_MAGIC, DssFlags, DssHeader, DssType, DssUnit, MAX_SEGMENT_LENGTH};
pub use encoding::{ByteOrder, Encoding};
pub use error::ProtocolError;
pub use reply::{ColumnDescriptor, FieldDescriptor, QueryDescriptor, ReplyMessage, SqlCard, SqlDard};
pub use session::{Dialect, SecurityMechanism, SessionConfig, UnknownDialect};
pub use types::DrdaType;
