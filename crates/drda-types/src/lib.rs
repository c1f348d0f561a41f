//! # drda-types
//!
//! DRDA to Rust type mappings and conversions.
//!
//! This crate decodes FD:OCA column values as described by a QRYDSC
//! descriptor, encodes them back (for test servers and round-trip checks),
//! and converts between [`SqlValue`] and Rust types.
//!
//! ## Type Mappings
//!
//! | DRDA type | Rust type |
//! |-----------|-----------|
//! | `BOOLEAN` | `bool` |
//! | `SMALLINT` | `i16` |
//! | `INTEGER` | `i32` |
//! | `BIGINT` | `i64` |
//! | `REAL` | `f32` |
//! | `DOUBLE` | `f64` |
//! | `DECIMAL` (packed) | `rust_decimal::Decimal` |
//! | `CHAR`/`VARCHAR`/`LONG VARCHAR` | `String` |
//! | `CHAR FOR BIT DATA`/`VARBINARY` | `Vec<u8>` |
//! | `DATE` | `chrono::NaiveDate` |
//! | `TIME` | `chrono::NaiveTime` |
//! | `TIMESTAMP` | `chrono::NaiveDateTime` |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod from_sql;
pub mod to_sql;
pub mod value;

pub use decode::{TypeInfo, ValueFormat, decode_row, decode_value};
pub use encode::{bind_params, encode_value};
pub use error::TypeError;
pub use from_sql::FromSql;
pub use to_sql::ToSql;
pub use value::SqlValue;
