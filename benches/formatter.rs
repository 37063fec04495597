//! Benchmark suite specifically for the record formatter.
//!
//! Isolates parsing and rendering from session and runtime overhead so the
//! per-record cost of the formatting logic can be measured directly.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use daq_recorder::{CsvFormatter, Record, RecordFormatter};

const RAW_READING: &str = "+1.23456789E-03,10,24,2024,16,00,5";

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("valid", |b| {
        b.iter(|| {
            let record = Record::parse(black_box(RAW_READING));
            black_box(record)
        })
    });

    group.bench_function("malformed", |b| {
        b.iter(|| {
            let record = Record::parse(black_box("+1.23456789E-03,10,24"));
            black_box(record)
        })
    });

    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_format");
    let record = Record::parse(RAW_READING).unwrap();
    let compact = CsvFormatter::new(false);
    let line_delimited = CsvFormatter::new(true);

    group.throughput(Throughput::Elements(1));

    group.bench_function("compact", |b| {
        b.iter(|| {
            let line = compact.format(black_box(&record));
            black_box(line)
        })
    });

    group.bench_function("line_delimited", |b| {
        b.iter(|| {
            let line = line_delimited.format(black_box(&record));
            black_box(line)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_format);
criterion_main!(benches);
