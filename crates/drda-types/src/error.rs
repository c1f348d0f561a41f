//! Type conversion error types.

use thiserror::Error;

/// Most decimal digits a `rust_decimal::Decimal` represents.
pub const MAX_DECIMAL_DIGITS: u8 = 28;

/// Errors that can occur while decoding, encoding or converting values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TypeError {
    /// Value is null when non-null was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: String,
    },

    /// Value is out of range for target type.
    #[error("value out of range for {target_type}")]
    OutOfRange {
        /// Target type name.
        target_type: &'static str,
    },

    /// String data cannot be represented in the session encoding.
    #[error("invalid string encoding: {0}")]
    InvalidEncoding(String),

    /// Invalid date/time value.
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),

    /// Invalid decimal value.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    /// A packed decimal value has more digits than `Decimal` can hold.
    #[error("DECIMAL precision {precision} exceeds the 28 digits a Decimal can hold")]
    DecimalPrecision {
        /// Declared column precision.
        precision: u8,
    },

    /// Value does not fit the declared column width.
    #[error("value truncated: {0}")]
    Truncation(String),

    /// Buffer too small for value.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// The query descriptor names a type tag this codec does not handle.
    #[error("unsupported data type tag 0x{0:02X}")]
    UnsupportedType(u8),

    /// Number of `?` placeholders differs from the number of parameters.
    #[error("statement has {expected} parameter markers but {actual} values were supplied")]
    ParameterCount {
        /// Placeholders found in the SQL text.
        expected: usize,
        /// Parameters supplied.
        actual: usize,
    },
}
