//! Benchmarks for DSS framing and reply decoding.

#![allow(clippy::unwrap_used, missing_docs)]

use bytes::{BufMut, Bytes, BytesMut};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use drda_protocol::{
    ByteOrder, Dialect, DssFlags, DssType, DssUnit, Encoding, QueryDescriptor, SessionConfig, SqlCard,
    command,
};

fn bench_frame_small(c: &mut Criterion) {
    let payload = command::commit();

    c.bench_function("dss_frame_small", |b| {
        b.iter(|| {
            let framed = DssUnit::frame(DssType::Request, DssFlags::empty(), 1, black_box(&payload));
            black_box(framed)
        })
    });
}

fn bench_decode_continued_unit(c: &mut Criterion) {
    let payload = vec![0x42u8; 100_000];
    let framed = DssUnit::frame(DssType::Reply, DssFlags::empty(), 1, &payload);

    let mut group = c.benchmark_group("dss_decode");
    group.throughput(Throughput::Bytes(framed.len() as u64));
    group.bench_function("continued_100k", |b| {
        b.iter(|| {
            let mut src = framed.clone();
            black_box(DssUnit::decode(&mut src).unwrap())
        })
    });
    group.finish();
}

fn bench_build_query_group(c: &mut Criterion) {
    let session = SessionConfig::new(Dialect::Db2, "SAMPLE", Some("db2inst1"), Some("pw")).unwrap();
    let sql = "SELECT ID, NAME, CREATED FROM APP.CUSTOMERS WHERE REGION = 'EU' ORDER BY ID";

    c.bench_function("build_db2_query_group", |b| {
        b.iter(|| {
            let prepare = command::prepare_db2(&session).unwrap();
            let attrs = command::sql_attributes(&session, "WITH HOLD ");
            let stmt = command::sql_statement(&session, black_box(sql));
            let open = command::open_query_db2(&session).unwrap();
            black_box((prepare, attrs, stmt, open))
        })
    });
}

fn bench_decode_sqlcard(c: &mut Criterion) {
    let order = ByteOrder::LittleEndian;
    let mut buf = BytesMut::new();
    buf.put_u8(0x00);
    order.put_i32(&mut buf, 0);
    buf.put_slice(b"00000SQLRI01F");
    buf.put_u8(0x00);
    for w in [0, 0, 1, 0, 0, 0] {
        order.put_i32(&mut buf, w);
    }
    buf.put_slice(b"           ");
    for s in [&b"SAMPLE"[..], b"", b""] {
        order.put_u16(&mut buf, s.len() as u16);
        buf.put_slice(s);
    }
    buf.put_u8(0xFF);
    let card = buf.freeze();

    c.bench_function("sqlcard_decode", |b| {
        b.iter(|| black_box(SqlCard::decode(card.clone(), order, Encoding::Utf8).unwrap()))
    });
}

fn bench_decode_qrydsc(c: &mut Criterion) {
    let mut raw = vec![0u8, 0x76, 0xD0];
    for _ in 0..32 {
        raw.extend_from_slice(&[0x33, 0x00, 0x40]);
    }
    raw[0] = raw.len() as u8;
    let data = Bytes::from(raw);

    c.bench_function("qrydsc_decode_32_columns", |b| {
        b.iter(|| black_box(QueryDescriptor::decode(black_box(&data)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_frame_small,
    bench_decode_continued_unit,
    bench_build_query_group,
    bench_decode_sqlcard,
    bench_decode_qrydsc,
);

criterion_main!(benches);
