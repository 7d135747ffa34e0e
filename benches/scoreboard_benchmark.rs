/*!
 * Scoreboard Benchmarks
 *
 * Compare shard counts under multi-threaded contention, and wake latency of
 * a blocked counter waiter
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stdkit::concurrent::condition::equal;
use stdkit::{AtomicCounter, Scoreboard, INDEFINITELY};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;
const OPS_PER_THREAD: usize = 1_000;

fn bench_contended_inc(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoreboard_contended_inc");

    for concurrency in [1usize, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &concurrency,
            |b, &concurrency| {
                let board = Arc::new(Scoreboard::with_concurrency(concurrency).unwrap());
                let keys: Arc<Vec<String>> =
                    Arc::new((0..64).map(|i| format!("key-{}", i)).collect());

                b.iter(|| {
                    let handles: Vec<_> = (0..THREADS)
                        .map(|t| {
                            let board = board.clone();
                            let keys = keys.clone();
                            thread::spawn(move || {
                                for i in 0..OPS_PER_THREAD {
                                    black_box(board.inc(&keys[(t + i) % keys.len()]));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_view(c: &mut Criterion) {
    let board = Scoreboard::new();
    for i in 0..1_000 {
        board.set(&format!("key-{}", i), i);
    }

    c.bench_function("scoreboard_view_1000_keys", |b| {
        b.iter(|| black_box(board.view()));
    });
}

fn bench_wake_latency(c: &mut Criterion) {
    c.bench_function("counter_wake_latency", |b| {
        b.iter(|| {
            let counter = Arc::new(AtomicCounter::new(1));
            let waiter = {
                let counter = counter.clone();
                thread::spawn(move || counter.await_cond(equal(0), INDEFINITELY, Duration::from_secs(1)))
            };

            counter.set(0);
            black_box(waiter.join().unwrap());
        });
    });
}

criterion_group!(benches, bench_contended_inc, bench_view, bench_wake_latency);
criterion_main!(benches);
