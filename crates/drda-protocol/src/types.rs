//! FD:OCA data type tags carried in QRYDSC triples.
//!
//! Each tag names a wire representation. Odd tags are the nullable variant
//! of the even tag below them and carry a 1-byte null indicator ahead of the
//! value.

/// Wire data type of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DrdaType {
    /// 4-byte integer.
    Integer = 0x02,
    /// 2-byte integer.
    SmallInt = 0x04,
    /// 1-byte integer.
    TinyInt = 0x06,
    /// 8-byte float.
    Float8 = 0x0A,
    /// 4-byte float.
    Float4 = 0x0C,
    /// Packed decimal.
    Decimal = 0x0E,
    /// 8-byte integer.
    BigInt = 0x16,
    /// Date as text.
    Date = 0x20,
    /// Time as text.
    Time = 0x22,
    /// Timestamp as text.
    Timestamp = 0x24,
    /// Fixed-length binary.
    FixedBytes = 0x26,
    /// Variable-length binary.
    VarBytes = 0x28,
    /// Long variable-length binary.
    LongVarBytes = 0x2A,
    /// Fixed-length single-byte characters.
    Char = 0x30,
    /// Variable-length single-byte characters.
    VarChar = 0x32,
    /// Long variable-length single-byte characters.
    LongVarChar = 0x34,
    /// Fixed-length mixed characters.
    Mixed = 0x3C,
    /// Variable-length mixed characters.
    VarMixed = 0x3E,
    /// Long variable-length mixed characters.
    LongMixed = 0x40,
    /// Boolean.
    Boolean = 0xBE,
}

impl DrdaType {
    /// Split a QRYDSC tag into its type and nullability.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<(Self, bool)> {
        let nullable = tag & 0x01 != 0;
        let ty = match tag & !0x01 {
            0x02 => Self::Integer,
            0x04 => Self::SmallInt,
            0x06 => Self::TinyInt,
            0x0A => Self::Float8,
            0x0C => Self::Float4,
            0x0E => Self::Decimal,
            0x16 => Self::BigInt,
            0x20 => Self::Date,
            0x22 => Self::Time,
            0x24 => Self::Timestamp,
            0x26 => Self::FixedBytes,
            0x28 => Self::VarBytes,
            0x2A => Self::LongVarBytes,
            0x30 => Self::Char,
            0x32 => Self::VarChar,
            0x34 => Self::LongVarChar,
            0x3C => Self::Mixed,
            0x3E => Self::VarMixed,
            0x40 => Self::LongMixed,
            0xBE => Self::Boolean,
            _ => return None,
        };
        Some((ty, nullable))
    }

    /// The tag for this type, with the nullable bit when requested.
    #[must_use]
    pub const fn tag(self, nullable: bool) -> u8 {
        self as u8 | nullable as u8
    }

    /// Whether the size spec holds (precision, scale) rather than a length.
    #[must_use]
    pub const fn has_precision(self) -> bool {
        matches!(self, Self::Decimal)
    }

    /// Upper-case SQL name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::SmallInt => "SMALLINT",
            Self::TinyInt => "TINYINT",
            Self::Float8 => "DOUBLE",
            Self::Float4 => "REAL",
            Self::Decimal => "DECIMAL",
            Self::BigInt => "BIGINT",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::FixedBytes => "BINARY",
            Self::VarBytes => "VARBINARY",
            Self::LongVarBytes => "LONG VARBINARY",
            Self::Char | Self::Mixed => "CHAR",
            Self::VarChar | Self::VarMixed => "VARCHAR",
            Self::LongVarChar | Self::LongMixed => "LONG VARCHAR",
            Self::Boolean => "BOOLEAN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_bit() {
        assert_eq!(DrdaType::from_tag(0x02), Some((DrdaType::Integer, false)));
        assert_eq!(DrdaType::from_tag(0x03), Some((DrdaType::Integer, true)));
        assert_eq!(DrdaType::from_tag(0xBF), Some((DrdaType::Boolean, true)));
        assert_eq!(DrdaType::VarChar.tag(true), 0x33);
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(DrdaType::from_tag(0x50), None);
        assert_eq!(DrdaType::from_tag(0x51), None);
    }
}
