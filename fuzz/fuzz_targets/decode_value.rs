#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use drda_protocol::{ByteOrder, Encoding};
use drda_types::{TypeInfo, ValueFormat};
use libfuzzer_sys::fuzz_target;

/// Fuzz input combining a QRYDSC pair with raw bytes.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    tag: u8,
    size: [u8; 2],
    db2: bool,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(info) = TypeInfo::from_descriptor(input.tag, input.size) else {
        return;
    };
    let format = if input.db2 {
        ValueFormat::new(Encoding::Cp500, ByteOrder::LittleEndian)
    } else {
        ValueFormat::new(Encoding::Utf8, ByteOrder::BigEndian)
    };

    let mut bytes = Bytes::from(input.data);
    let _ = drda_types::decode_value(&mut bytes, &info, format);
});
