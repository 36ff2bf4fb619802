use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use idwell::{BatchIdGenerator, MemoryStore};
use std::{sync::Arc, thread::scope, time::Instant};

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

/// Benchmarks single-threaded allocation on one scope.
fn bench_next_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/next_id");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = BatchIdGenerator::new(MemoryStore::new())
                    .with_batch_size(1000)
                    .unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id("bench").unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks a shared generator across threads contending on one scope.
fn bench_next_id_contended(c: &mut Criterion) {
    let threads = num_cpus::get();
    let mut group = c.benchmark_group("generator/next_id_contended");
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    group.bench_function(format!("threads/{}/elems/{}", threads, TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = Arc::new(
                    BatchIdGenerator::new(MemoryStore::new())
                        .with_batch_size(1000)
                        .unwrap(),
                );

                scope(|s| {
                    for _ in 0..threads {
                        let generator = Arc::clone(&generator);
                        s.spawn(move || {
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.next_id("bench").unwrap());
                            }
                        });
                    }
                });
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks per-thread scopes, exercising registry lookups with no
/// cross-scope contention.
fn bench_next_id_independent_scopes(c: &mut Criterion) {
    let threads = num_cpus::get();
    let mut group = c.benchmark_group("generator/next_id_independent_scopes");
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    group.bench_function(format!("threads/{}/elems/{}", threads, TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = Arc::new(
                    BatchIdGenerator::new(MemoryStore::new())
                        .with_batch_size(1000)
                        .unwrap(),
                );

                scope(|s| {
                    for thread in 0..threads {
                        let generator = Arc::clone(&generator);
                        let scope_name = format!("bench-{thread}");
                        s.spawn(move || {
                            for _ in 0..TOTAL_IDS {
                                black_box(generator.next_id(&scope_name).unwrap());
                            }
                        });
                    }
                });
            }

            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_next_id,
    bench_next_id_contended,
    bench_next_id_independent_scopes
);
criterion_main!(benches);
