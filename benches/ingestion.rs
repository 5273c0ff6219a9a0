use std::io::Cursor;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use csv2xlsx::ingestion::csv::CommaRecords;
use csv2xlsx::ingestion::tsv::TabRecords;
use csv2xlsx::ingestion::txt::LineRecords;
use csv2xlsx::types::{CellOption, CellValue};

const ROWS: usize = 10_000;

fn comma_input() -> String {
    let mut s = String::from("id,name,score,note\n");
    for i in 0..ROWS {
        s.push_str(&format!("{i},name-{i},{}.25,\"quoted, with comma\"\n", i % 100));
    }
    s
}

fn tab_input() -> String {
    let mut s = String::from("id\tname\tscore\n");
    for i in 0..ROWS {
        s.push_str(&format!("{i}\tname-{i}\t{}.5\n", i % 100));
    }
    s
}

fn bench_readers(c: &mut Criterion) {
    let csv = comma_input();
    let tsv = tab_input();

    let mut group = c.benchmark_group("readers");
    group.throughput(Throughput::Bytes(csv.len() as u64));
    group.bench_function("csv", |b| {
        b.iter(|| {
            let mut rdr = CommaRecords::new(Cursor::new(csv.as_bytes()));
            let mut n = 0usize;
            while let Some(rec) = rdr.next_record().unwrap() {
                n += rec.len();
            }
            black_box(n)
        })
    });

    group.throughput(Throughput::Bytes(tsv.len() as u64));
    group.bench_function("tsv", |b| {
        b.iter(|| {
            let mut rdr = TabRecords::new(tsv.as_bytes());
            let mut n = 0usize;
            while let Some(rec) = rdr.next_record().unwrap() {
                n += rec.len();
            }
            black_box(n)
        })
    });

    group.bench_function("txt", |b| {
        b.iter(|| {
            let mut rdr = LineRecords::new(Cursor::new(tsv.as_bytes()));
            let mut n = 0usize;
            while let Some(rec) = rdr.next_record().unwrap() {
                n += rec.len();
            }
            black_box(n)
        })
    });
    group.finish();
}

fn bench_inference(c: &mut Criterion) {
    let raw: Vec<String> = (0..ROWS)
        .map(|i| match i % 3 {
            0 => format!("{i}"),
            1 => format!("{}.{}", i, i % 7),
            _ => format!("text-{i}"),
        })
        .collect();
    let option = CellOption::with_decimal_places(2);

    c.bench_function("cell_inference", |b| {
        b.iter(|| {
            raw.iter()
                .filter(|s| CellValue::infer(s, &option).is_number())
                .count()
        })
    });
}

criterion_group!(benches, bench_readers, bench_inference);
criterion_main!(benches);
