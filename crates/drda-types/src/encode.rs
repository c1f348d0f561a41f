//! FD:OCA binary encoding and SQL literal rendering.
//!
//! [`encode_value`] is the exact inverse of [`decode_value`](crate::decode_value)
//! and is used to build server replies in tests. [`bind_params`] embeds
//! parameters into SQL text as literals, since statements are sent as
//! immediate SQL.

use bytes::{BufMut, BytesMut};
use chrono::Timelike;
use drda_protocol::DrdaType;
use rust_decimal::Decimal;

use crate::decode::{TypeInfo, ValueFormat};
use crate::error::TypeError;
use crate::value::SqlValue;

fn mismatch(expected: &'static str, value: &SqlValue) -> TypeError {
    TypeError::TypeMismatch {
        expected,
        actual: value.type_name().to_string(),
    }
}

fn encode_text(text: &str, format: ValueFormat) -> Result<Vec<u8>, TypeError> {
    format
        .encoding
        .encode(text)
        .map_err(|e| TypeError::InvalidEncoding(e.to_string()))
}

fn put_fixed(buf: &mut BytesMut, mut raw: Vec<u8>, width: usize, pad: u8) -> Result<(), TypeError> {
    if raw.len() > width {
        return Err(TypeError::Truncation(format!(
            "{} bytes into a {width}-byte field",
            raw.len()
        )));
    }
    raw.resize(width, pad);
    buf.put_slice(&raw);
    Ok(())
}

fn put_prefixed(buf: &mut BytesMut, raw: &[u8], format: ValueFormat) -> Result<(), TypeError> {
    let len = u16::try_from(raw.len()).map_err(|_| TypeError::OutOfRange {
        target_type: "VARCHAR",
    })?;
    format.byte_order.put_u16(buf, len);
    buf.put_slice(raw);
    Ok(())
}

/// Encode one value as the server would send it for `info`.
pub fn encode_value(
    value: &SqlValue,
    info: &TypeInfo,
    format: ValueFormat,
    buf: &mut BytesMut,
) -> Result<(), TypeError> {
    if info.nullable {
        if value.is_null() {
            buf.put_u8(0xFF);
            return Ok(());
        }
        buf.put_u8(0x00);
    } else if value.is_null() {
        return Err(TypeError::UnexpectedNull);
    }

    let order = format.byte_order;
    let space = format.encoding.space();
    let width = info.length as usize;

    match (info.drda_type, value) {
        (DrdaType::TinyInt, SqlValue::TinyInt(v)) => buf.put_i8(*v),
        (DrdaType::SmallInt, SqlValue::SmallInt(v)) => order.put_i16(buf, *v),
        (DrdaType::Integer, SqlValue::Int(v)) => order.put_i32(buf, *v),
        (DrdaType::BigInt, SqlValue::BigInt(v)) => order.put_i64(buf, *v),
        (DrdaType::Float4, SqlValue::Float(v)) => order.put_f32(buf, *v),
        (DrdaType::Float8, SqlValue::Double(v)) => order.put_f64(buf, *v),
        (DrdaType::Boolean, SqlValue::Bool(v)) => buf.put_u8(u8::from(*v)),
        (DrdaType::Decimal, SqlValue::Decimal(v)) => {
            buf.put_slice(&encode_packed_decimal(*v, info.precision, info.scale)?);
        }
        (DrdaType::Date, SqlValue::Date(v)) => {
            let text = v.format("%Y-%m-%d").to_string();
            put_fixed(buf, encode_text(&text, format)?, width, space)?;
        }
        (DrdaType::Time, SqlValue::Time(v)) => {
            let text = v.format("%H.%M.%S").to_string();
            put_fixed(buf, encode_text(&text, format)?, width, space)?;
        }
        (DrdaType::Timestamp, SqlValue::DateTime(v)) => {
            let text = timestamp_text(v, width);
            put_fixed(buf, encode_text(&text, format)?, width, space)?;
        }
        (DrdaType::FixedBytes, SqlValue::Binary(v)) => put_fixed(buf, v.to_vec(), width, 0x00)?,
        (DrdaType::VarBytes | DrdaType::LongVarBytes, SqlValue::Binary(v)) => {
            put_prefixed(buf, v, format)?;
        }
        (DrdaType::Char | DrdaType::Mixed, SqlValue::String(v)) => {
            put_fixed(buf, encode_text(v, format)?, width, space)?;
        }
        (
            DrdaType::VarChar | DrdaType::LongVarChar | DrdaType::VarMixed | DrdaType::LongMixed,
            SqlValue::String(v),
        ) => put_prefixed(buf, &encode_text(v, format)?, format)?,
        (ty, other) => return Err(mismatch(ty.name(), other)),
    }
    Ok(())
}

/// `YYYY-MM-DD-HH.MM.SS.fff…` with as many fraction digits as fit `width`.
fn timestamp_text(v: &chrono::NaiveDateTime, width: usize) -> String {
    let base = v.format("%Y-%m-%d-%H.%M.%S").to_string();
    let digits = width.saturating_sub(base.len() + 1).min(9);
    if digits == 0 {
        return base;
    }
    let fraction = format!("{:09}", v.nanosecond());
    format!("{base}.{}", &fraction[..digits])
}

/// Encode a decimal as packed BCD with the given precision and scale.
pub fn encode_packed_decimal(value: Decimal, precision: u8, scale: u8) -> Result<Vec<u8>, TypeError> {
    let mut scaled = value;
    scaled.rescale(u32::from(scale));
    if scaled.scale() != u32::from(scale) {
        return Err(TypeError::InvalidDecimal(format!("cannot rescale {value} to {scale}")));
    }

    let len = precision as usize / 2 + 1;
    let digit_slots = len * 2 - 1;
    let digits = scaled.mantissa().unsigned_abs().to_string();
    if digits.len() > digit_slots || (digits != "0" && digits.len() > precision as usize) {
        return Err(TypeError::OutOfRange {
            target_type: "DECIMAL",
        });
    }

    let mut nibbles: Vec<u8> = std::iter::repeat_n(0u8, digit_slots - digits.len())
        .chain(digits.bytes().map(|b| b - b'0'))
        .collect();
    nibbles.push(if scaled.is_sign_negative() && !scaled.is_zero() {
        0x0D
    } else {
        0x0C
    });

    Ok(nibbles.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl SqlValue {
    /// Render the value as an SQL literal.
    ///
    /// Non-finite floating point values have no literal form.
    pub fn to_sql_literal(&self) -> Result<String, TypeError> {
        Ok(match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
            Self::TinyInt(v) => v.to_string(),
            Self::SmallInt(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::BigInt(v) => v.to_string(),
            Self::Float(v) if v.is_finite() => format!("{v:E}"),
            Self::Double(v) if v.is_finite() => format!("{v:E}"),
            Self::Float(_) | Self::Double(_) => {
                return Err(TypeError::OutOfRange {
                    target_type: "DOUBLE",
                });
            }
            Self::Decimal(v) => v.to_string(),
            Self::String(v) => quote(v),
            Self::Binary(v) => {
                let hex: String = v.iter().map(|b| format!("{b:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Date(v) => format!("DATE('{}')", v.format("%Y-%m-%d")),
            Self::Time(v) => format!("TIME('{}')", v.format("%H:%M:%S")),
            Self::DateTime(v) => format!("TIMESTAMP('{}')", v.format("%Y-%m-%d %H:%M:%S%.f")),
        })
    }
}

/// Replace each `?` outside single-quoted literals with the next parameter
/// rendered as an SQL literal.
pub fn bind_params(sql: &str, params: &[SqlValue]) -> Result<String, TypeError> {
    let markers = count_markers(sql);
    if markers != params.len() {
        return Err(TypeError::ParameterCount {
            expected: markers,
            actual: params.len(),
        });
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut next = params.iter();
    let mut in_literal = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                if let Some(param) = next.next() {
                    out.push_str(&param.to_sql_literal()?);
                }
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Count `?` markers outside single-quoted literals.
///
/// A doubled quote inside a literal toggles the state twice and so leaves
/// it unchanged.
#[must_use]
pub fn count_markers(sql: &str) -> usize {
    let mut in_literal = false;
    let mut count = 0;
    for ch in sql.chars() {
        match ch {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::Bytes;
    use chrono::{NaiveDate, NaiveTime};
    use drda_protocol::{ByteOrder, Encoding};

    use super::*;
    use crate::decode::decode_value;

    const DB2: ValueFormat = ValueFormat::new(Encoding::Cp500, ByteOrder::LittleEndian);

    #[test]
    fn test_packed_decimal_layout() {
        assert_eq!(
            encode_packed_decimal(Decimal::new(-12345, 2), 5, 2).unwrap(),
            vec![0x12, 0x34, 0x5D]
        );
        assert_eq!(
            encode_packed_decimal(Decimal::new(1, 0), 2, 1).unwrap(),
            vec![0x01, 0x0C]
        );
        assert!(matches!(
            encode_packed_decimal(Decimal::new(123_456, 0), 5, 0),
            Err(TypeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_fixed_char_padding_uses_session_space() {
        let info = TypeInfo::new(DrdaType::Char, 4);
        let mut buf = BytesMut::new();
        encode_value(&SqlValue::from("AB"), &info, DB2, &mut buf).unwrap();
        assert_eq!(&buf[..], &[0xC1, 0xC2, 0x40, 0x40]);

        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_value(&SqlValue::from("ABCDE"), &info, DB2, &mut buf),
            Err(TypeError::Truncation(_))
        ));
    }

    #[test]
    fn test_null_into_non_nullable_column() {
        let mut buf = BytesMut::new();
        assert_eq!(
            encode_value(&SqlValue::Null, &TypeInfo::new(DrdaType::Integer, 4), DB2, &mut buf),
            Err(TypeError::UnexpectedNull)
        );
    }

    #[test]
    fn test_timestamp_width_controls_fraction() {
        let ts = NaiveDate::from_ymd_opt(2020, 5, 6)
            .unwrap()
            .and_hms_nano_opt(7, 8, 9, 123_456_789)
            .unwrap();
        assert_eq!(timestamp_text(&ts, 26), "2020-05-06-07.08.09.123456");
        assert_eq!(timestamp_text(&ts, 29), "2020-05-06-07.08.09.123456789");
        assert_eq!(timestamp_text(&ts, 19), "2020-05-06-07.08.09");
    }

    #[test]
    fn test_time_roundtrip_through_cp500() {
        let info = TypeInfo::new(DrdaType::Time, 8);
        let value = SqlValue::Time(NaiveTime::from_hms_opt(23, 1, 2).unwrap());
        let mut buf = BytesMut::new();
        encode_value(&value, &info, DB2, &mut buf).unwrap();
        let mut src: Bytes = buf.freeze();
        assert_eq!(decode_value(&mut src, &info, DB2).unwrap(), value);
    }

    #[test]
    fn test_sql_literals() {
        assert_eq!(SqlValue::Null.to_sql_literal().unwrap(), "NULL");
        assert_eq!(SqlValue::from("O'Brien").to_sql_literal().unwrap(), "'O''Brien'");
        assert_eq!(
            SqlValue::from(vec![0xDE, 0xAD]).to_sql_literal().unwrap(),
            "X'DEAD'"
        );
        assert_eq!(
            SqlValue::Decimal(Decimal::new(-150, 2)).to_sql_literal().unwrap(),
            "-1.50"
        );
        assert_eq!(
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
                .to_sql_literal()
                .unwrap(),
            "DATE('2024-01-02')"
        );
        assert_eq!(SqlValue::Double(1.5).to_sql_literal().unwrap(), "1.5E0");
        assert!(SqlValue::Double(f64::NAN).to_sql_literal().is_err());
    }

    #[test]
    fn test_bind_params_skips_quoted_markers() {
        let sql = "SELECT * FROM T WHERE A = ? AND B = '?' AND C = 'it''s ?' AND D = ?";
        let bound = bind_params(sql, &[SqlValue::Int(1), SqlValue::from("x")]).unwrap();
        assert_eq!(
            bound,
            "SELECT * FROM T WHERE A = 1 AND B = '?' AND C = 'it''s ?' AND D = 'x'"
        );
    }

    #[test]
    fn test_bind_params_count_mismatch() {
        assert_eq!(
            bind_params("VALUES (?, ?)", &[SqlValue::Int(1)]),
            Err(TypeError::ParameterCount {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(bind_params("VALUES 1", &[]).unwrap(), "VALUES 1");
    }
}
