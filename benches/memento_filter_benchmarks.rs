//! Memento Filter Benchmarks
//!
//! Performance benchmarking for the dynamic range filter.
//!
//! Benchmarks:
//! 1. Construction with varying slot counts and target FPRs
//! 2. Single insertion latency
//! 3. Batch insertions (100, 1000, 10000)
//! 4. Auto-resize overhead under sparse insertion
//! 5. Point query latency (hit/miss)
//! 6. Range query latency (narrow/wide)
//! 7. Bulk load throughput
//! 8. Iteration and stats collection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sketch_oxide::common::RangeFilter;
use sketch_oxide::range_filters::{MementoFilter, OperationFlags};

// ============================================================================
// Construction Benchmarks
// ============================================================================

fn bench_memento_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_construction");

    for n_slots in [1_024u64, 16_384, 262_144, 1 << 20].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n_slots), n_slots, |b, &n_slots| {
            b.iter(|| {
                let filter = MementoFilter::new(black_box(n_slots), black_box(12), black_box(5));
                black_box(filter)
            });
        });
    }

    group.finish();
}

fn bench_memento_construction_varying_fpr(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_construction_varying_fpr");

    for fpr in [0.001, 0.01, 0.05, 0.1].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(fpr), fpr, |b, &fpr| {
            b.iter(|| {
                let filter = MementoFilter::with_target_fpr(black_box(10_000), black_box(fpr), black_box(5));
                black_box(filter)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Insertion Benchmarks
// ============================================================================

fn bench_memento_single_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_single_insertion");
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert", |b| {
        let mut filter = MementoFilter::new(1 << 20, 12, 5).unwrap();
        let mut key = 0u64;
        b.iter(|| {
            filter.insert(black_box(key), OperationFlags::NO_LOCK);
            key = key.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_memento_batch_insertions(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_batch_insertions");

    for &batch_size in [100u64, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(batch_size));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, &batch_size| {
            b.iter(|| {
                let mut filter = MementoFilter::new(1 << 20, 12, 5).unwrap();
                for i in 0..batch_size {
                    filter.insert(black_box(i * 10), OperationFlags::NO_LOCK);
                }
                black_box(filter)
            });
        });
    }

    group.finish();
}

fn bench_memento_auto_resize_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_auto_resize_overhead");

    group.bench_function("insert_forcing_repeated_resize", |b| {
        b.iter(|| {
            let mut filter = MementoFilter::new(128, 12, 5).unwrap();
            for i in 0..5_000u64 {
                filter.insert(black_box(i), OperationFlags::NO_LOCK);
            }
            black_box(filter)
        });
    });

    group.finish();
}

// ============================================================================
// Query Benchmarks
// ============================================================================

fn bench_memento_point_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_point_query");
    group.throughput(Throughput::Elements(1));

    let mut filter = MementoFilter::new(1 << 18, 14, 5).unwrap();
    for i in 0..50_000u64 {
        filter.insert(i * 3, OperationFlags::NO_LOCK);
    }

    group.bench_function("hit", |b| {
        let mut idx = 0u64;
        b.iter(|| {
            let present = (idx % 50_000) * 3;
            idx = idx.wrapping_add(1);
            black_box(filter.point_query(black_box(present), OperationFlags::NO_LOCK))
        });
    });

    group.bench_function("miss", |b| {
        let mut idx = 0u64;
        b.iter(|| {
            let absent = (idx % 50_000) * 3 + 1;
            idx = idx.wrapping_add(1);
            black_box(filter.point_query(black_box(absent), OperationFlags::NO_LOCK))
        });
    });

    group.finish();
}

fn bench_memento_range_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_range_query");
    group.throughput(Throughput::Elements(1));

    let mut filter = MementoFilter::new(1 << 18, 14, 5).unwrap();
    for i in 0..10_000u64 {
        filter.insert(i * 10, OperationFlags::NO_LOCK);
    }

    group.bench_function("range_query_small", |b| {
        let mut start = 0u64;
        b.iter(|| {
            let result = filter.may_contain_range(black_box(start), black_box(start + 100));
            start += 100;
            black_box(result)
        });
    });

    group.bench_function("range_query_medium", |b| {
        let mut start = 0u64;
        b.iter(|| {
            let result = filter.may_contain_range(black_box(start), black_box(start + 1_000));
            start += 1_000;
            black_box(result)
        });
    });

    group.bench_function("range_query_large", |b| {
        let mut start = 0u64;
        b.iter(|| {
            let result = filter.may_contain_range(black_box(start), black_box(start + 10_000));
            start += 10_000;
            black_box(result)
        });
    });

    group.finish();
}

// ============================================================================
// Bulk Load / Iteration Benchmarks
// ============================================================================

fn bench_memento_bulk_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_bulk_load");

    for &n in [1_000u64, 10_000, 100_000].iter() {
        let keys: Vec<u64> = (0..n).map(|i| i * 7).collect();
        group.throughput(Throughput::Elements(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &keys, |b, keys| {
            b.iter(|| {
                let mut filter = MementoFilter::new(1 << 20, 14, 5).unwrap();
                filter.bulk_load(black_box(keys));
                black_box(filter)
            });
        });
    }

    group.finish();
}

fn bench_memento_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_iteration");

    let mut filter = MementoFilter::new(1 << 18, 14, 5).unwrap();
    for i in 0..50_000u64 {
        filter.insert(i * 3, OperationFlags::NO_LOCK);
    }

    group.bench_function("full_scan", |b| {
        b.iter(|| black_box(filter.iter().count()));
    });

    group.finish();
}

// ============================================================================
// Throughput Benchmarks
// ============================================================================

fn bench_memento_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_throughput");

    group.bench_function("insert_throughput_100k", |b| {
        b.iter(|| {
            let mut filter = MementoFilter::new(1 << 20, 12, 5).unwrap();
            for i in 0..100_000u64 {
                filter.insert(black_box(i), OperationFlags::NO_LOCK);
            }
            black_box(filter)
        });
    });

    group.bench_function("query_throughput_100k", |b| {
        let mut filter = MementoFilter::new(1 << 20, 12, 5).unwrap();
        for i in 0..100_000u64 {
            filter.insert(i, OperationFlags::NO_LOCK);
        }

        b.iter(|| {
            for i in 0..100_000u64 {
                black_box(filter.point_query(black_box(i), OperationFlags::NO_LOCK));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Stats Collection Benchmarks
// ============================================================================

fn bench_memento_stats_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_stats");

    let mut filter = MementoFilter::new(1 << 16, 12, 5).unwrap();
    for i in 0..1_000u64 {
        filter.insert(i, OperationFlags::NO_LOCK);
    }

    group.bench_function("stats_collection", |b| {
        b.iter(|| black_box(filter.stats()));
    });

    group.bench_function("load_factor", |b| {
        b.iter(|| black_box(filter.load_factor()));
    });

    group.finish();
}

// ============================================================================
// Serialization Benchmarks
// ============================================================================

fn bench_memento_serialize_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("memento_serialize_roundtrip");

    let mut filter = MementoFilter::new(1 << 16, 12, 5).unwrap();
    for i in 0..10_000u64 {
        filter.insert(i * 3, OperationFlags::NO_LOCK);
    }

    group.bench_function("serialize", |b| {
        b.iter(|| black_box(filter.serialize()));
    });

    let bytes = filter.serialize();
    group.bench_function("deserialize", |b| {
        b.iter(|| black_box(MementoFilter::deserialize(black_box(&bytes)).unwrap()));
    });

    group.finish();
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    benches,
    bench_memento_construction,
    bench_memento_construction_varying_fpr,
    bench_memento_single_insertion,
    bench_memento_batch_insertions,
    bench_memento_auto_resize_overhead,
    bench_memento_point_query,
    bench_memento_range_query,
    bench_memento_bulk_load,
    bench_memento_iteration,
    bench_memento_throughput,
    bench_memento_stats_collection,
    bench_memento_serialize_roundtrip,
);

criterion_main!(benches);
