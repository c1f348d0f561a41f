//! Benchmarks for reply parsing, row access and configuration.

#![allow(missing_docs, clippy::unwrap_used)]

use std::hint::black_box;

use bytes::Bytes;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use drda_client::Config;
use drda_client::response::parse_chain;
use drda_protocol::{Dialect, DssUnit, SessionConfig};
use drda_testing::{MockColumn, fixtures};
use drda_types::SqlValue;

fn bench_connection_string_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("connection_string");

    let derby = "Host=localhost;Port=1527;Database=testdb";
    group.throughput(Throughput::Bytes(derby.len() as u64));
    group.bench_function("derby", |b| {
        b.iter(|| black_box(Config::from_connection_string(black_box(derby))))
    });

    let db2 = "Host=db.local;Port=50000;Database=SAMPLE;User=db2inst1;Password=secret;\
               Dialect=db2;Workstation=ws01;Locale=en_US;Connect Timeout=30";
    group.throughput(Throughput::Bytes(db2.len() as u64));
    group.bench_function("db2_full", |b| {
        b.iter(|| black_box(Config::from_connection_string(black_box(db2))))
    });

    group.finish();
}

fn result_chain(dialect: Dialect, rows: usize) -> Vec<DssUnit> {
    let columns = [
        MockColumn::integer("ID"),
        MockColumn::varchar("NAME", 64).nullable(),
        MockColumn::double("SCORE"),
    ];
    let data: Vec<Vec<SqlValue>> = (0..rows)
        .map(|i| {
            vec![
                SqlValue::Int(i as i32),
                SqlValue::String(format!("name-{i}")),
                SqlValue::Double(i as f64 * 0.5),
            ]
        })
        .collect();
    let mut src = Bytes::from(
        fixtures::result_set(dialect, &columns, &data)
            .build()
            .unwrap(),
    );
    let mut units = Vec::new();
    while !src.is_empty() {
        units.push(DssUnit::decode(&mut src).unwrap());
    }
    units
}

fn bench_parse_result_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_result_chain");
    for dialect in [Dialect::Derby, Dialect::Db2] {
        let session = SessionConfig::new(dialect, "TESTDB", Some("u"), Some("p")).unwrap();
        let chain = result_chain(dialect, 1000);
        group.throughput(Throughput::Elements(1000));
        group.bench_function(dialect.as_str(), |b| {
            b.iter(|| black_box(parse_chain(black_box(&chain), &session).unwrap()))
        });
    }
    group.finish();
}

fn bench_row_access(c: &mut Criterion) {
    let session = SessionConfig::new(Dialect::Derby, "TESTDB", None, None).unwrap();
    let chain = result_chain(Dialect::Derby, 1000);
    let rs = parse_chain(&chain, &session).unwrap().into_result_set();

    c.bench_function("row_get_by_index", |b| {
        b.iter(|| {
            let mut total = 0i64;
            for row in rs.clone() {
                total += i64::from(row.get::<i32>(0).unwrap());
            }
            black_box(total)
        })
    });

    c.bench_function("row_get_by_name", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for row in rs.clone() {
                total += row.get_by_name::<String>("NAME").unwrap().len();
            }
            black_box(total)
        })
    });
}

criterion_group!(
    benches,
    bench_connection_string_parsing,
    bench_parse_result_chain,
    bench_row_access
);
criterion_main!(benches);
