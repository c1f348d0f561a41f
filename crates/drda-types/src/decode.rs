//! FD:OCA binary decoding for column values.
//!
//! One value is decoded per QRYDSC field descriptor. Numeric fields honour
//! the session byte order; character fields are decoded with the session
//! encoding; date, time and timestamp fields arrive as fixed-width text.

use bytes::{Buf, Bytes};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use drda_protocol::{ByteOrder, DrdaType, Encoding, FieldDescriptor, SessionConfig};
use rust_decimal::Decimal;

use crate::error::{MAX_DECIMAL_DIGITS, TypeError};
use crate::value::SqlValue;

/// Null indicator values at or above this mark a NULL.
const NULL_INDICATOR_MIN: u8 = 0x80;

/// Largest DECIMAL precision a descriptor may declare.
const MAX_PACKED_PRECISION: u8 = 31;

/// Type information for one result column, built from a QRYDSC pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    /// Wire data type.
    pub drda_type: DrdaType,
    /// Whether a null indicator byte precedes the value.
    pub nullable: bool,
    /// Declared length for fixed-width and date/time types.
    pub length: u16,
    /// Precision for decimals.
    pub precision: u8,
    /// Scale for decimals.
    pub scale: u8,
}

impl TypeInfo {
    /// Build type information from a (type tag, size spec) pair.
    pub fn from_descriptor(tag: u8, size: [u8; 2]) -> Result<Self, TypeError> {
        let (drda_type, nullable) = DrdaType::from_tag(tag).ok_or(TypeError::UnsupportedType(tag))?;
        if drda_type.has_precision() {
            let [precision, scale] = size;
            if precision == 0 || precision > MAX_PACKED_PRECISION || scale > precision {
                return Err(TypeError::InvalidDecimal(format!(
                    "descriptor DECIMAL({precision}, {scale})"
                )));
            }
        }
        Ok(Self {
            drda_type,
            nullable,
            length: u16::from_be_bytes(size),
            precision: size[0],
            scale: size[1],
        })
    }

    /// Build type information from a decoded field descriptor.
    pub fn from_field(field: &FieldDescriptor) -> Result<Self, TypeError> {
        Self::from_descriptor(field.tag, field.size)
    }

    /// Create type info for a non-decimal type with a declared length.
    #[must_use]
    pub fn new(drda_type: DrdaType, length: u16) -> Self {
        let [precision, scale] = length.to_be_bytes();
        Self {
            drda_type,
            nullable: false,
            length,
            precision,
            scale,
        }
    }

    /// Create type info for a packed decimal.
    #[must_use]
    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self {
            drda_type: DrdaType::Decimal,
            nullable: false,
            length: u16::from_be_bytes([precision, scale]),
            precision,
            scale,
        }
    }

    /// Mark the column nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The QRYDSC tag for this column.
    #[must_use]
    pub fn tag(&self) -> u8 {
        self.drda_type.tag(self.nullable)
    }

    /// Bytes occupied by a packed decimal of this precision.
    #[must_use]
    pub fn packed_len(&self) -> usize {
        self.precision as usize / 2 + 1
    }
}

/// Session representation used when decoding or encoding values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFormat {
    /// Character encoding.
    pub encoding: Encoding,
    /// Byte order of numeric and length fields.
    pub byte_order: ByteOrder,
}

impl ValueFormat {
    /// Create a format.
    #[must_use]
    pub const fn new(encoding: Encoding, byte_order: ByteOrder) -> Self {
        Self {
            encoding,
            byte_order,
        }
    }

    /// The format negotiated for a session.
    #[must_use]
    pub fn for_session(session: &SessionConfig) -> Self {
        Self::new(session.encoding(), session.byte_order())
    }
}

fn need(buf: &Bytes, n: usize) -> Result<(), TypeError> {
    if buf.remaining() < n {
        return Err(TypeError::BufferTooSmall {
            needed: n,
            available: buf.remaining(),
        });
    }
    Ok(())
}

fn take(buf: &mut Bytes, n: usize) -> Result<Bytes, TypeError> {
    need(buf, n)?;
    Ok(buf.split_to(n))
}

fn take_prefixed(buf: &mut Bytes, order: ByteOrder) -> Result<Bytes, TypeError> {
    need(buf, 2)?;
    let len = order.get_u16(buf) as usize;
    take(buf, len)
}

/// Decode one value, consuming exactly the bytes it occupies.
pub fn decode_value(
    buf: &mut Bytes,
    info: &TypeInfo,
    format: ValueFormat,
) -> Result<SqlValue, TypeError> {
    if info.nullable {
        need(buf, 1)?;
        if buf.get_u8() >= NULL_INDICATOR_MIN {
            return Ok(SqlValue::Null);
        }
    }

    let order = format.byte_order;
    let value = match info.drda_type {
        DrdaType::TinyInt => {
            need(buf, 1)?;
            SqlValue::TinyInt(buf.get_i8())
        }
        DrdaType::SmallInt => {
            need(buf, 2)?;
            SqlValue::SmallInt(order.get_i16(buf))
        }
        DrdaType::Integer => {
            need(buf, 4)?;
            SqlValue::Int(order.get_i32(buf))
        }
        DrdaType::BigInt => {
            need(buf, 8)?;
            SqlValue::BigInt(order.get_i64(buf))
        }
        DrdaType::Float4 => {
            need(buf, 4)?;
            SqlValue::Float(order.get_f32(buf))
        }
        DrdaType::Float8 => {
            need(buf, 8)?;
            SqlValue::Double(order.get_f64(buf))
        }
        DrdaType::Decimal => {
            let raw = take(buf, info.packed_len())?;
            let value = decode_packed_decimal(&raw, info.scale).map_err(|e| match e {
                TypeError::DecimalPrecision { .. } => TypeError::DecimalPrecision {
                    precision: info.precision,
                },
                other => other,
            })?;
            SqlValue::Decimal(value)
        }
        DrdaType::Boolean => {
            need(buf, 1)?;
            SqlValue::Bool(buf.get_u8() != 0)
        }
        DrdaType::Date => {
            let text = format.encoding.decode(&take(buf, info.length as usize)?);
            SqlValue::Date(parse_date(&text)?)
        }
        DrdaType::Time => {
            let text = format.encoding.decode(&take(buf, info.length as usize)?);
            SqlValue::Time(parse_time(&text)?)
        }
        DrdaType::Timestamp => {
            let text = format.encoding.decode(&take(buf, info.length as usize)?);
            SqlValue::DateTime(parse_timestamp(&text)?)
        }
        DrdaType::FixedBytes => SqlValue::Binary(take(buf, info.length as usize)?),
        DrdaType::VarBytes | DrdaType::LongVarBytes => SqlValue::Binary(take_prefixed(buf, order)?),
        DrdaType::Char | DrdaType::Mixed => {
            SqlValue::String(format.encoding.decode(&take(buf, info.length as usize)?))
        }
        DrdaType::VarChar | DrdaType::LongVarChar | DrdaType::VarMixed | DrdaType::LongMixed => {
            SqlValue::String(format.encoding.decode(&take_prefixed(buf, order)?))
        }
    };
    Ok(value)
}

/// Decode one row: a value per column, in column order.
pub fn decode_row(
    buf: &mut Bytes,
    columns: &[TypeInfo],
    format: ValueFormat,
) -> Result<Vec<SqlValue>, TypeError> {
    columns
        .iter()
        .map(|info| decode_value(buf, info, format))
        .collect()
}

/// Decode a packed decimal: two digits per byte, sign in the last nibble.
///
/// Values needing more than [`MAX_DECIMAL_DIGITS`] digits fail with
/// [`TypeError::DecimalPrecision`] naming the digit count of `raw`.
pub fn decode_packed_decimal(raw: &[u8], scale: u8) -> Result<Decimal, TypeError> {
    let Some((&last, _)) = raw.split_last() else {
        return Err(TypeError::InvalidDecimal("empty packed decimal".into()));
    };
    let too_wide = || TypeError::DecimalPrecision {
        precision: u8::try_from(raw.len() * 2 - 1).unwrap_or(u8::MAX),
    };

    let mut mantissa: i128 = 0;
    let nibbles = raw
        .iter()
        .flat_map(|b| [b >> 4, b & 0x0F])
        .take(raw.len() * 2 - 1);
    for digit in nibbles {
        if digit > 9 {
            return Err(TypeError::InvalidDecimal(format!("bad digit nibble 0x{digit:X}")));
        }
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(i128::from(digit)))
            .ok_or_else(too_wide)?;
    }

    if matches!(last & 0x0F, 0x0B | 0x0D) {
        mantissa = -mantissa;
    }

    if scale > MAX_DECIMAL_DIGITS {
        return Err(too_wide());
    }
    Decimal::try_from_i128_with_scale(mantissa, u32::from(scale)).map_err(|_| too_wide())
}

/// Trim trailing pad characters from fixed-width date/time text.
fn trim_pad(text: &str) -> &str {
    text.trim_end_matches([' ', '\0'])
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Result<NaiveDate, TypeError> {
    let text = trim_pad(text);
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| TypeError::InvalidDateTime(format!("date {text:?}")))
}

/// Parse `HH.MM.SS` or `HH:MM:SS`.
pub fn parse_time(text: &str) -> Result<NaiveTime, TypeError> {
    let text = trim_pad(text);
    NaiveTime::parse_from_str(&text.replace('.', ":"), "%H:%M:%S")
        .map_err(|_| TypeError::InvalidDateTime(format!("time {text:?}")))
}

/// Parse `YYYY-MM-DD-HH.MM.SS[.fffffffff…]`.
///
/// A space is accepted in place of the date/time separator and colons in
/// place of the dots. Fractions beyond nanoseconds are truncated.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, TypeError> {
    let text = trim_pad(text);
    let invalid = || TypeError::InvalidDateTime(format!("timestamp {text:?}"));
    if !text.is_ascii() || text.len() < 19 {
        return Err(invalid());
    }

    let date = parse_date(&text[..10]).map_err(|_| invalid())?;
    if !matches!(text.as_bytes()[10], b'-' | b' ' | b'T') {
        return Err(invalid());
    }
    let time = parse_time(&text[11..19]).map_err(|_| invalid())?;

    let nanos = match text.get(19..) {
        None | Some("") => 0,
        Some(rest) => {
            let digits = rest.strip_prefix('.').ok_or_else(invalid)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            digits
                .bytes()
                .chain(std::iter::repeat(b'0'))
                .take(9)
                .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
        }
    };

    let time = time.with_nanosecond(nanos).ok_or_else(invalid)?;
    Ok(NaiveDateTime::new(date, time))
}
