//! Column inference and pipeline benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::io::Write;
use tabforge::{Session, Value, infer_column_type, normalize_text};
use tempfile::NamedTempFile;

/// A column of mixed date strings with some garbage.
fn date_column(rows: usize) -> Vec<Value> {
    (0..rows)
        .map(|row| match row % 4 {
            0 => Value::text(format!("2023-{:02}-{:02}", (row % 12) + 1, (row % 28) + 1)),
            1 => Value::text(format!("{:02}/{:02}/2023", (row % 12) + 1, (row % 28) + 1)),
            2 => Value::text(format!("Jan {}, 2023", (row % 28) + 1)),
            _ => Value::text("pendente"),
        })
        .collect()
}

fn numeric_column(rows: usize) -> Vec<Value> {
    (0..rows)
        .map(|row| {
            if row % 10 == 0 {
                Value::Null
            } else {
                Value::text(format!("{:.2}", row as f64 * 1.5))
            }
        })
        .collect()
}

fn text_column(rows: usize) -> Vec<Value> {
    let names = ["João", "Conceição", "Ana", "Müller", "Zoë"];
    (0..rows)
        .map(|row| Value::text(format!("{} {}", names[row % names.len()], row)))
        .collect()
}

fn generate_csv(rows: usize) -> String {
    let mut data = String::from("id,cliente,valor,data\n");
    for row in 0..rows {
        data.push_str(&format!(
            "{},Cliente {},{:.2},2024-{:02}-{:02}\n",
            row % (rows / 2).max(1),
            row % (rows / 2).max(1),
            (row % 500) as f64 * 3.25,
            (row % 12) + 1,
            (row % 28) + 1
        ));
    }
    data
}

fn bench_infer_column(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_column");

    for rows in [1_000, 10_000, 100_000].iter() {
        group.throughput(Throughput::Elements(*rows as u64));

        let dates = date_column(*rows);
        group.bench_with_input(BenchmarkId::new("dates", rows), &dates, |b, column| {
            b.iter(|| black_box(infer_column_type(column.clone())))
        });

        let numbers = numeric_column(*rows);
        group.bench_with_input(BenchmarkId::new("numbers", rows), &numbers, |b, column| {
            b.iter(|| black_box(infer_column_type(column.clone())))
        });

        let text = text_column(*rows);
        group.bench_with_input(BenchmarkId::new("text", rows), &text, |b, column| {
            b.iter(|| black_box(infer_column_type(column.clone())))
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let column = text_column(10_000);

    c.bench_function("normalize_text_10k", |b| {
        b.iter(|| {
            for value in column.iter().cloned() {
                black_box(normalize_text(value));
            }
        })
    });
}

fn bench_load_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_csv");
    group.sample_size(10);

    for rows in [1_000, 50_000].iter() {
        let data = generate_csv(*rows);
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(BenchmarkId::new("rows", rows), &data, |b, data| {
            b.iter_with_setup(
                || {
                    let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
                    temp.write_all(data.as_bytes()).unwrap();
                    temp
                },
                |temp| {
                    let mut session = Session::new();
                    black_box(session.load_csv(temp.path()).unwrap())
                },
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_infer_column, bench_normalize, bench_load_csv);
criterion_main!(benches);
