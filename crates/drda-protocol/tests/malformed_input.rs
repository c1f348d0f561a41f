//! Decoders must reject arbitrary input with an error, never a panic.

#![allow(clippy::unwrap_used)]

use bytes::Bytes;
use drda_protocol::{
    ByteOrder, DdmObject, DssFlags, DssType, DssUnit, Encoding, Objects, QueryDescriptor, SqlCard,
    SqlDard,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn dss_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut src = Bytes::from(data);
        let _ = DssUnit::decode(&mut src);
    }

    #[test]
    fn object_iteration_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        for obj in Objects::new(Bytes::from(data)).flatten() {
            let _ = obj.params().count();
        }
    }

    #[test]
    fn reply_objects_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let bytes = Bytes::from(data);
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            let _ = SqlCard::decode(bytes.clone(), order, Encoding::Utf8);
            let _ = SqlDard::decode(bytes.clone(), order, Encoding::Cp500);
        }
        let _ = QueryDescriptor::decode(&bytes);
    }

    #[test]
    fn framed_payload_is_recovered(
        payload in proptest::collection::vec(any::<u8>(), 0..80_000),
        correlation_id in any::<u16>(),
        chained in any::<bool>(),
    ) {
        let flags = if chained { DssFlags::CHAINED } else { DssFlags::empty() };
        let mut src = DssUnit::frame(DssType::Reply, flags, correlation_id, &payload);
        let unit = DssUnit::decode(&mut src).unwrap();
        prop_assert!(src.is_empty());
        prop_assert_eq!(unit.is_chained(), chained);
        prop_assert_eq!(unit.correlation_id(), correlation_id);
        prop_assert_eq!(&unit.payload[..], &payload[..]);
    }
}

#[test]
fn object_spanning_past_payload_is_reported() {
    let mut src = Bytes::from_static(&[0x00, 0x0A, 0x24, 0x08, 0xFF]);
    assert!(DdmObject::decode(&mut src).is_err());
}
