//! Batch planning benchmarks
//!
//! Measures how fast a bulk submission is measured and split into batches,
//! and the cost of a full bulk write against the in-memory primary.
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench planner
//! cargo bench --bench planner -- "plan/mixed"
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use writepath::testing::InMemoryPrimary;
use writepath::{
    doc, BatchPlanner, BincodeCodec, BsonSizeCodec, BulkWriteOptions, Collection, CommandBuilder,
    CommandOptions, DocumentCodec, Executor, WireLimits, WriteModel,
};

const OP_COUNTS: &[usize] = &[100, 1_000, 10_000];

fn inserts(n: usize, payload: usize) -> Vec<WriteModel> {
    (0..n)
        .map(|i| WriteModel::InsertOne {
            document: doc! { "_id": i as i64, "payload": "x".repeat(payload) },
        })
        .collect()
}

fn mixed(n: usize) -> Vec<WriteModel> {
    (0..n)
        .map(|i| match i % 3 {
            0 => WriteModel::InsertOne {
                document: doc! { "_id": i as i64 },
            },
            1 => WriteModel::UpdateOne {
                filter: doc! { "_id": i as i64 },
                update: doc! { "$inc": doc! { "n": 1i64 } },
                upsert: false,
            },
            _ => WriteModel::DeleteOne {
                filter: doc! { "_id": i as i64 },
            },
        })
        .collect()
}

fn plan_with(codec: &dyn DocumentCodec, models: Vec<WriteModel>, limits: WireLimits) -> usize {
    let builder = CommandBuilder::new("bench");
    let options = CommandOptions::default();
    match BatchPlanner::new(&builder, codec, &options, limits).plan(models) {
        Ok(batches) => batches.len(),
        Err(e) => panic!("planning failed: {}", e),
    }
}

fn plan_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan/inserts");
    for &n in OP_COUNTS {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("bson", n), &n, |b, &n| {
            b.iter_batched(
                || inserts(n, 64),
                |models| black_box(plan_with(&BsonSizeCodec, models, WireLimits::default())),
                criterion::BatchSize::LargeInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("bincode", n), &n, |b, &n| {
            b.iter_batched(
                || inserts(n, 64),
                |models| black_box(plan_with(&BincodeCodec, models, WireLimits::default())),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn plan_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan/mixed");
    for &n in OP_COUNTS {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || mixed(n),
                |models| black_box(plan_with(&BsonSizeCodec, models, WireLimits::default())),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn plan_size_split(c: &mut Criterion) {
    let limits = WireLimits::new(1000, 64 * 1024).unwrap();
    c.bench_function("plan/size_split", |b| {
        b.iter_batched(
            || inserts(1_000, 1024),
            |models| black_box(plan_with(&BsonSizeCodec, models, limits)),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bulk_write_in_memory(c: &mut Criterion) {
    let collection = Collection::new("bench", "items");
    c.bench_function("bulk_write/unordered_1000", |b| {
        b.iter_batched(
            || (Executor::new(InMemoryPrimary::new()), inserts(1_000, 64)),
            |(executor, models)| {
                black_box(executor.bulk_write(&collection, models, BulkWriteOptions::unordered()))
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group! {
    name = planning;
    config = Criterion::default();
    targets = plan_inserts, plan_mixed, plan_size_split
}

criterion_group! {
    name = execution;
    config = Criterion::default();
    targets = bulk_write_in_memory
}

criterion_main!(planning, execution);
