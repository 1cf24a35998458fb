//! Comparison function benchmarks.
//!
//! Measures batch evaluation for:
//! - Relational operators on integer columns
//! - GREATEST over fixed-width columns
//! - LEAST over strings (ping-pong scratch buffers)
//! - INTERVAL binary vs linear search

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vexpr::{
    new_signature, Column, ColumnRef, CompareOp, ComparisonFunction, Constant, EvalContext,
    EvalType, Expression, IntervalSearch, VectorizedBatch,
};

const BATCH_SIZES: &[usize] = &[256, 1024, 4096];

fn random_ints(rng: &mut StdRng, rows: usize) -> ArrayRef {
    let values: Vec<Option<i64>> = (0..rows)
        .map(|_| rng.gen_bool(0.95).then(|| rng.gen_range(-1_000..1_000)))
        .collect();
    Arc::new(Int64Array::from(values))
}

fn random_strings(rng: &mut StdRng, rows: usize) -> ArrayRef {
    let values: Vec<String> = (0..rows)
        .map(|_| {
            let len = rng.gen_range(4..16);
            (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
        })
        .collect();
    Arc::new(StringArray::from(values))
}

fn make_batch(columns: Vec<(&str, ArrayRef)>) -> VectorizedBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).expect("build batch");
    VectorizedBatch::new(batch)
}

fn column(input: &VectorizedBatch, name: &str) -> Box<dyn Expression> {
    Box::new(ColumnRef::from_schema(&input.schema(), name).expect("column"))
}

/// Benchmark `a < b` over two integer columns
fn bench_int_lt(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_int_lt");
    let mut rng = StdRng::seed_from_u64(7);

    for &rows in BATCH_SIZES {
        let input = make_batch(vec![
            ("a", random_ints(&mut rng, rows)),
            ("b", random_ints(&mut rng, rows)),
        ]);
        let lt = new_signature(
            ComparisonFunction::Compare(CompareOp::Lt),
            EvalType::Int,
            vec![column(&input, "a"), column(&input, "b")],
        )
        .expect("signature");
        let ctx = EvalContext::default();
        let mut out = Column::new(EvalType::Int, rows);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                lt.vec_eval_int(&ctx, &input, &mut out).expect("evaluate");
                black_box(out.len())
            });
        });
    }

    group.finish();
}

/// Benchmark GREATEST(a, b, c)
fn bench_greatest(c: &mut Criterion) {
    let mut group = c.benchmark_group("greatest_int_3");
    let mut rng = StdRng::seed_from_u64(11);

    for &rows in BATCH_SIZES {
        let input = make_batch(vec![
            ("a", random_ints(&mut rng, rows)),
            ("b", random_ints(&mut rng, rows)),
            ("c", random_ints(&mut rng, rows)),
        ]);
        let greatest = new_signature(
            ComparisonFunction::Greatest,
            EvalType::Int,
            vec![column(&input, "a"), column(&input, "b"), column(&input, "c")],
        )
        .expect("signature");
        let ctx = EvalContext::default();
        let mut out = Column::new(EvalType::Int, rows);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                greatest.vec_eval_int(&ctx, &input, &mut out).expect("evaluate");
                black_box(out.len())
            });
        });
    }

    group.finish();
}

/// Benchmark string LEAST with an even and an odd operand count
fn bench_string_least(c: &mut Criterion) {
    let mut group = c.benchmark_group("least_string");
    let mut rng = StdRng::seed_from_u64(13);
    let rows = 1024;
    let input = make_batch(vec![
        ("a", random_strings(&mut rng, rows)),
        ("b", random_strings(&mut rng, rows)),
        ("c", random_strings(&mut rng, rows)),
        ("d", random_strings(&mut rng, rows)),
    ]);
    let ctx = EvalContext::default();

    for operands in [3usize, 4] {
        let args = ["a", "b", "c", "d"][..operands]
            .iter()
            .map(|name| column(&input, name))
            .collect();
        let least =
            new_signature(ComparisonFunction::Least, EvalType::String, args).expect("signature");
        let mut out = Column::new(EvalType::String, rows);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("operands", operands), &operands, |b, _| {
            b.iter(|| {
                least.vec_eval_string(&ctx, &input, &mut out).expect("evaluate");
                black_box(out.len())
            });
        });
    }

    group.finish();
}

/// Benchmark INTERVAL(target, 0, 10, 20, ...) with both search strategies
fn bench_interval(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval");
    let mut rng = StdRng::seed_from_u64(17);
    let rows = 1024;
    let input = make_batch(vec![("t", random_ints(&mut rng, rows))]);
    let ctx = EvalContext::default();

    for search in [IntervalSearch::Binary, IntervalSearch::Linear] {
        let mut args = vec![column(&input, "t")];
        args.extend((-32..32).map(|b| Box::new(Constant::int(b * 32)) as Box<dyn Expression>));
        let interval = new_signature(ComparisonFunction::Interval(search), EvalType::Int, args)
            .expect("signature");
        let mut out = Column::new(EvalType::Int, rows);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_function(format!("{search:?}_64_boundaries").to_lowercase(), |b| {
            b.iter(|| {
                interval.vec_eval_int(&ctx, &input, &mut out).expect("evaluate");
                black_box(out.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_int_lt, bench_greatest, bench_string_least, bench_interval);
criterion_main!(benches);
