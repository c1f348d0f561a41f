//! Character encodings and byte orders negotiated per session.
//!
//! DRDA sessions carry two pieces of representation state that every builder
//! and decoder needs: the single-byte character encoding used for strings,
//! and the byte order used for numeric and length fields inside FD:OCA data.
//! Both are fixed when the session configuration is built.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;

/// Character encoding used for DDM string parameters and character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// UTF-8 (CCSID 1208).
    Utf8,
    /// EBCDIC international, code page 500.
    Cp500,
}

impl Encoding {
    /// IBM CCSID of this encoding.
    #[must_use]
    pub const fn ccsid(self) -> u16 {
        match self {
            Self::Utf8 => 1208,
            Self::Cp500 => 500,
        }
    }

    /// Human-readable encoding name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Cp500 => "IBM500",
        }
    }

    /// The byte used to pad fixed-width fields.
    #[must_use]
    pub const fn space(self) -> u8 {
        match self {
            Self::Utf8 => b' ',
            Self::Cp500 => 0x40,
        }
    }

    /// Encode a string.
    ///
    /// Fails when a character has no representation in this encoding.
    pub fn encode(self, s: &str) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Utf8 => Ok(s.as_bytes().to_vec()),
            Self::Cp500 => s
                .chars()
                .map(|ch| {
                    u8::try_from(u32::from(ch))
                        .map(|latin1| LATIN1_TO_CP500[latin1 as usize])
                        .map_err(|_| ProtocolError::Encoding {
                            value: s.to_string(),
                            encoding: self.name(),
                        })
                })
                .collect(),
        }
    }

    /// Encode a string into a fixed-width field, padding with spaces or
    /// truncating as needed.
    pub fn encode_fixed(self, s: &str, width: usize) -> Result<Vec<u8>, ProtocolError> {
        let mut out = self.encode(s)?;
        out.resize(width, self.space());
        Ok(out)
    }

    /// Decode bytes into a string.
    ///
    /// UTF-8 input that is not valid UTF-8 is decoded as windows-1252, the
    /// single-byte Western encoding. Code page 500 decoding never fails.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => s.to_string(),
                Err(_) => {
                    let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                    decoded.into_owned()
                }
            },
            Self::Cp500 => bytes
                .iter()
                .map(|&b| char::from(CP500_TO_LATIN1[b as usize]))
                .collect(),
        }
    }
}

/// Byte order for numeric and length fields inside FD:OCA data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first.
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl ByteOrder {
    /// Read a signed 16-bit integer.
    pub fn get_i16(self, buf: &mut impl Buf) -> i16 {
        match self {
            Self::BigEndian => buf.get_i16(),
            Self::LittleEndian => buf.get_i16_le(),
        }
    }

    /// Read an unsigned 16-bit integer.
    pub fn get_u16(self, buf: &mut impl Buf) -> u16 {
        match self {
            Self::BigEndian => buf.get_u16(),
            Self::LittleEndian => buf.get_u16_le(),
        }
    }

    /// Read a signed 32-bit integer.
    pub fn get_i32(self, buf: &mut impl Buf) -> i32 {
        match self {
            Self::BigEndian => buf.get_i32(),
            Self::LittleEndian => buf.get_i32_le(),
        }
    }

    /// Read a signed 64-bit integer.
    pub fn get_i64(self, buf: &mut impl Buf) -> i64 {
        match self {
            Self::BigEndian => buf.get_i64(),
            Self::LittleEndian => buf.get_i64_le(),
        }
    }

    /// Read a 32-bit float.
    pub fn get_f32(self, buf: &mut impl Buf) -> f32 {
        match self {
            Self::BigEndian => buf.get_f32(),
            Self::LittleEndian => buf.get_f32_le(),
        }
    }

    /// Read a 64-bit float.
    pub fn get_f64(self, buf: &mut impl Buf) -> f64 {
        match self {
            Self::BigEndian => buf.get_f64(),
            Self::LittleEndian => buf.get_f64_le(),
        }
    }

    /// Write a signed 16-bit integer.
    pub fn put_i16(self, buf: &mut impl BufMut, v: i16) {
        match self {
            Self::BigEndian => buf.put_i16(v),
            Self::LittleEndian => buf.put_i16_le(v),
        }
    }

    /// Write an unsigned 16-bit integer.
    pub fn put_u16(self, buf: &mut impl BufMut, v: u16) {
        match self {
            Self::BigEndian => buf.put_u16(v),
            Self::LittleEndian => buf.put_u16_le(v),
        }
    }

    /// Write a signed 32-bit integer.
    pub fn put_i32(self, buf: &mut impl BufMut, v: i32) {
        match self {
            Self::BigEndian => buf.put_i32(v),
            Self::LittleEndian => buf.put_i32_le(v),
        }
    }

    /// Write an unsigned 32-bit integer.
    pub fn put_u32(self, buf: &mut impl BufMut, v: u32) {
        match self {
            Self::BigEndian => buf.put_u32(v),
            Self::LittleEndian => buf.put_u32_le(v),
        }
    }

    /// Write a signed 64-bit integer.
    pub fn put_i64(self, buf: &mut impl BufMut, v: i64) {
        match self {
            Self::BigEndian => buf.put_i64(v),
            Self::LittleEndian => buf.put_i64_le(v),
        }
    }

    /// Write a 32-bit float.
    pub fn put_f32(self, buf: &mut impl BufMut, v: f32) {
        match self {
            Self::BigEndian => buf.put_f32(v),
            Self::LittleEndian => buf.put_f32_le(v),
        }
    }

    /// Write a 64-bit float.
    pub fn put_f64(self, buf: &mut impl BufMut, v: f64) {
        match self {
            Self::BigEndian => buf.put_f64(v),
            Self::LittleEndian => buf.put_f64_le(v),
        }
    }
}

/// Code page 500 byte to Latin-1 code point.
const CP500_TO_LATIN1: [u8; 256] = [
    0x00, 0x01, 0x02, 0x03, 0x9C, 0x09, 0x86, 0x7F, 0x97, 0x8D, 0x8E, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    0x10, 0x11, 0x12, 0x13, 0x9D, 0x85, 0x08, 0x87, 0x18, 0x19, 0x92, 0x8F, 0x1C, 0x1D, 0x1E, 0x1F,
    0x80, 0x81, 0x82, 0x83, 0x84, 0x0A, 0x17, 0x1B, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x05, 0x06, 0x07,
    0x90, 0x91, 0x16, 0x93, 0x94, 0x95, 0x96, 0x04, 0x98, 0x99, 0x9A, 0x9B, 0x14, 0x15, 0x9E, 0x1A,
    0x20, 0xA0, 0xE2, 0xE4, 0xE0, 0xE1, 0xE3, 0xE5, 0xE7, 0xF1, 0x5B, 0x2E, 0x3C, 0x28, 0x2B, 0x21,
    0x26, 0xE9, 0xEA, 0xEB, 0xE8, 0xED, 0xEE, 0xEF, 0xEC, 0xDF, 0x5D, 0x24, 0x2A, 0x29, 0x3B, 0x5E,
    0x2D, 0x2F, 0xC2, 0xC4, 0xC0, 0xC1, 0xC3, 0xC5, 0xC7, 0xD1, 0xA6, 0x2C, 0x25, 0x5F, 0x3E, 0x3F,
    0xF8, 0xC9, 0xCA, 0xCB, 0xC8, 0xCD, 0xCE, 0xCF, 0xCC, 0x60, 0x3A, 0x23, 0x40, 0x27, 0x3D, 0x22,
    0xD8, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0xAB, 0xBB, 0xF0, 0xFD, 0xFE, 0xB1,
    0xB0, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F, 0x70, 0x71, 0x72, 0xAA, 0xBA, 0xE6, 0xB8, 0xC6, 0xA4,
    0xB5, 0x7E, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0xA1, 0xBF, 0xD0, 0xDD, 0xDE, 0xAE,
    0xA2, 0xA3, 0xA5, 0xB7, 0xA9, 0xA7, 0xB6, 0xBC, 0xBD, 0xBE, 0xAC, 0x7C, 0xAF, 0xA8, 0xB4, 0xD7,
    0x7B, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0xAD, 0xF4, 0xF6, 0xF2, 0xF3, 0xF5,
    0x7D, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F, 0x50, 0x51, 0x52, 0xB9, 0xFB, 0xFC, 0xF9, 0xFA, 0xFF,
    0x5C, 0xF7, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5A, 0xB2, 0xD4, 0xD6, 0xD2, 0xD3, 0xD5,
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0xB3, 0xDB, 0xDC, 0xD9, 0xDA, 0x9F,
];

/// Latin-1 code point to code page 500 byte. Code page 500 is a
/// permutation of Latin-1, so the inverse is total.
const LATIN1_TO_CP500: [u8; 256] = invert(&CP500_TO_LATIN1);

const fn invert(table: &[u8; 256]) -> [u8; 256] {
    let mut out = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        out[table[i] as usize] = i as u8;
        i += 1;
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cp500_known_bytes() {
        assert_eq!(Encoding::Cp500.encode("APP").unwrap(), vec![0xC1, 0xD7, 0xD7]);
        assert_eq!(Encoding::Cp500.encode(" ").unwrap(), vec![0x40]);
        assert_eq!(
            Encoding::Cp500.encode("0123456789").unwrap(),
            vec![0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9]
        );
        assert_eq!(Encoding::Cp500.encode("[]").unwrap(), vec![0x4A, 0x5A]);
    }

    #[test]
    fn test_cp500_roundtrip_all_latin1() {
        let all: String = (0u8..=255).map(char::from).collect();
        let encoded = Encoding::Cp500.encode(&all).unwrap();
        assert_eq!(Encoding::Cp500.decode(&encoded), all);
    }

    #[test]
    fn test_cp500_rejects_non_latin1() {
        let err = Encoding::Cp500.encode("日本").unwrap_err();
        assert!(matches!(err, ProtocolError::Encoding { encoding: "IBM500", .. }));
    }

    #[test]
    fn test_utf8_fallback_to_windows_1252() {
        // 0xE9 alone is not valid UTF-8 but is 'é' in windows-1252
        assert_eq!(Encoding::Utf8.decode(&[b'c', b'a', b'f', 0xE9]), "café");
        assert_eq!(Encoding::Utf8.decode("café".as_bytes()), "café");
    }

    #[test]
    fn test_encode_fixed_pads_and_truncates() {
        assert_eq!(Encoding::Utf8.encode_fixed("ab", 4).unwrap(), b"ab  ".to_vec());
        assert_eq!(Encoding::Utf8.encode_fixed("abcdef", 4).unwrap(), b"abcd".to_vec());
        assert_eq!(
            Encoding::Cp500.encode_fixed("A", 3).unwrap(),
            vec![0xC1, 0x40, 0x40]
        );
    }

    #[test]
    fn test_byte_order_integers() {
        let mut buf = Vec::new();
        ByteOrder::LittleEndian.put_i32(&mut buf, 1);
        ByteOrder::BigEndian.put_i32(&mut buf, 1);
        assert_eq!(buf, vec![1, 0, 0, 0, 0, 0, 0, 1]);

        let mut cursor = buf.as_slice();
        assert_eq!(ByteOrder::LittleEndian.get_i32(&mut cursor), 1);
        assert_eq!(ByteOrder::BigEndian.get_i32(&mut cursor), 1);
    }
}
