use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use flakegen::{
    AtomicIdGenerator, DEFAULT_EPOCH, IdGenerator, MonotonicClock, ParsedId, SnowflakeGenerator,
    TimeSource,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

#[derive(Clone, Copy)]
struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

const FIXED: FixedMockTime = FixedMockTime {
    millis: DEFAULT_EPOCH + 1,
};

// Number of IDs generated per benchmark iteration (shared across threads for
// contended runs). With a frozen clock this is exactly one millisecond's worth
// of sequence values, so the hot path never has to wait.
const TOTAL_IDS: usize = 4096;

/// Benchmarks the hot path of a fresh generator.
fn bench_generator<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: SnowflakeGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next().expect("id"));
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks one generator shared across threads.
fn bench_generator_contended<G>(c: &mut Criterion, group_name: &str, generator_fn: impl Fn() -> G)
where
    G: SnowflakeGenerator + Send + Sync,
{
    let mut group = c.benchmark_group(group_name);
    let max_threads = num_cpus::get().max(1);

    for thread_count in [1, 2, 4, 8, 16]
        .into_iter()
        .filter(|&n| n <= max_threads)
    {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(
            format!("elems/{}/threads/{}", TOTAL_IDS, thread_count),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let generator = Arc::new(generator_fn());
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let generator = Arc::clone(&generator);
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        black_box(generator.next().expect("id"));
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

/// `MockTime`
fn benchmark_mock_sequential_lock(c: &mut Criterion) {
    bench_generator(c, "mock/sequential/lock", || {
        IdGenerator::with_clock(0, DEFAULT_EPOCH, FIXED).expect("node id")
    });
}

fn benchmark_mock_sequential_atomic(c: &mut Criterion) {
    bench_generator(c, "mock/sequential/atomic", || {
        AtomicIdGenerator::with_clock(0, DEFAULT_EPOCH, FIXED).expect("node id")
    });
}

fn benchmark_mock_contended_lock(c: &mut Criterion) {
    bench_generator_contended(c, "mock/contended/lock", || {
        IdGenerator::with_clock(0, DEFAULT_EPOCH, FIXED).expect("node id")
    });
}

fn benchmark_mock_contended_atomic(c: &mut Criterion) {
    bench_generator_contended(c, "mock/contended/atomic", || {
        AtomicIdGenerator::with_clock(0, DEFAULT_EPOCH, FIXED).expect("node id")
    });
}

/// `MonotonicClock`. Generators persist across iterations, so these include
/// waits for the next millisecond.
fn benchmark_mono_sequential_lock(c: &mut Criterion) {
    let generator =
        IdGenerator::with_clock(0, DEFAULT_EPOCH, MonotonicClock::default()).expect("node id");
    bench_generator(c, "mono/sequential/lock", || generator.clone());
}

fn benchmark_mono_sequential_atomic(c: &mut Criterion) {
    let generator =
        AtomicIdGenerator::with_clock(0, DEFAULT_EPOCH, MonotonicClock::default())
            .expect("node id");
    bench_generator(c, "mono/sequential/atomic", || generator.clone());
}

fn benchmark_mono_contended_lock(c: &mut Criterion) {
    let clock = MonotonicClock::default();
    bench_generator_contended(c, "mono/contended/lock", || {
        IdGenerator::with_clock(0, DEFAULT_EPOCH, clock.clone()).expect("node id")
    });
}

fn benchmark_mono_contended_atomic(c: &mut Criterion) {
    let clock = MonotonicClock::default();
    bench_generator_contended(c, "mono/contended/atomic", || {
        AtomicIdGenerator::with_clock(0, DEFAULT_EPOCH, clock.clone()).expect("node id")
    });
}

fn benchmark_parse(c: &mut Criterion) {
    let generator = IdGenerator::with_clock(7, DEFAULT_EPOCH, FIXED).expect("node id");
    let ids: Vec<u64> = (0..TOTAL_IDS)
        .map(|_| generator.next().expect("id"))
        .collect();

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));
    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter(|| {
            for &id in &ids {
                black_box(ParsedId::decode(black_box(id), DEFAULT_EPOCH));
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    // Mock clock
    benchmark_mock_sequential_lock,
    benchmark_mock_sequential_atomic,
    benchmark_mock_contended_lock,
    benchmark_mock_contended_atomic, // spins on CAS failures
    // Monotonic clock
    benchmark_mono_sequential_lock,
    benchmark_mono_sequential_atomic,
    benchmark_mono_contended_lock,
    benchmark_mono_contended_atomic,
    // Decoding
    benchmark_parse,
);
criterion_main!(benches);
