/*!
 * Concurrent Primitives Integration Tests
 *
 * Counters and references under real thread contention
 */

use pretty_assertions::assert_eq;
use stdkit::concurrent::condition::{equal, greater_than, ref_equal};
use stdkit::concurrent::{forever, timeout, AtomicCounter, AtomicReference, Context};
use stdkit::INDEFINITELY;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const ONE_HOUR: Duration = Duration::from_secs(3600);

#[test]
fn test_concurrent_inc_dec_sums() {
    let counter = Arc::new(AtomicCounter::default());
    let threads = 8;
    let iterations = 10_000;

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..iterations {
                    if i % 2 == 0 {
                        counter.add(3);
                    } else {
                        counter.dec();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // 4 threads adding 3, 4 threads subtracting 1
    assert_eq!(counter.get(), 4 * iterations * 3 - 4 * iterations);
}

#[test]
fn test_cas_exactly_one_winner() {
    let counter = Arc::new(AtomicCounter::new(0));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let counter = counter.clone();
            let barrier = barrier.clone();
            let winners = winners.clone();
            thread::spawn(move || {
                barrier.wait();
                if counter.compare_and_swap(0, i as i64 + 1) {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(counter.get() >= 1 && counter.get() <= threads as i64);
}

#[test]
fn test_await_wakes_long_before_interval() {
    let counter = Arc::new(AtomicCounter::new(1));
    let writer = {
        let counter = counter.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(1));
            counter.set(0);
        })
    };

    let start = Instant::now();
    let value = counter.await_cond(equal(0), ONE_HOUR, ONE_HOUR);
    let elapsed = start.elapsed();

    writer.join().unwrap();
    assert_eq!(value, 0);
    // Bounded by the writer's sleep plus scheduling slack, not the interval
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[test]
fn test_await_timeout_returns_last_observed() {
    let counter = AtomicCounter::new(42);
    let start = Instant::now();
    let value = counter.await_cond(|v| v < 0, Duration::from_millis(50), None);

    assert_eq!(value, 42);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_two_waiters_both_wake() {
    let counter = Arc::new(AtomicCounter::new(1));
    let waiters = 2;
    let ready = Arc::new(Barrier::new(waiters + 1));

    let handles: Vec<_> = (0..waiters)
        .map(|_| {
            let counter = counter.clone();
            let ready = ready.clone();
            thread::spawn(move || {
                ready.wait();
                counter.await_cond(equal(0), INDEFINITELY, ONE_HOUR)
            })
        })
        .collect();

    ready.wait();
    // Give both waiters a chance to park
    thread::sleep(Duration::from_millis(20));
    assert_eq!(counter.dec(), 0);

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0);
    }

    // Setting with nobody waiting must not block
    counter.set(0);
    counter.set(0);
}

#[test]
fn test_await_ctx_returns_immediately_when_satisfied() {
    let counter = AtomicCounter::new(5);
    let ctx = forever(&Context::background());
    let start = Instant::now();
    assert_eq!(counter.await_ctx(&ctx, greater_than(0), ONE_HOUR), 5);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_await_ctx_cancel() {
    let counter = Arc::new(AtomicCounter::new(1));
    let ctx = forever(&Context::background());
    let canceller = {
        let ctx = ctx.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(1));
            ctx.cancel();
        })
    };

    let start = Instant::now();
    assert_eq!(counter.await_ctx(&ctx, equal(0), ONE_HOUR), 1);
    assert!(start.elapsed() < Duration::from_secs(5));
    canceller.join().unwrap();
}

#[test]
fn test_await_ctx_deadline() {
    let counter = AtomicCounter::new(1);
    let ctx = timeout(&Context::background(), Duration::from_millis(30));
    let start = Instant::now();
    assert_eq!(counter.await_ctx(&ctx, equal(0), ONE_HOUR), 1);
    assert!(start.elapsed() >= Duration::from_millis(30));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_parent_cancel_releases_child_waiters() {
    let counter = Arc::new(AtomicCounter::new(1));
    let parent = forever(&Context::background());
    let child = timeout(&parent, ONE_HOUR);

    let waiter = {
        let counter = counter.clone();
        thread::spawn(move || counter.await_ctx(&child, equal(0), ONE_HOUR))
    };

    thread::sleep(Duration::from_millis(10));
    parent.cancel();
    assert_eq!(waiter.join().unwrap(), 1);
}

#[test]
fn test_fill_and_drain() {
    let counter = Arc::new(AtomicCounter::new(0));
    let producer = {
        let counter = counter.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                counter.inc();
            }
        })
    };

    assert_eq!(counter.fill(10, Duration::from_secs(10), None), 10);
    producer.join().unwrap();

    let consumer = {
        let counter = counter.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                counter.dec();
            }
        })
    };

    assert_eq!(counter.drain(0, Duration::from_secs(10), None), 0);
    consumer.join().unwrap();
}

#[test]
fn test_reference_await_across_threads() {
    let reference = Arc::new(AtomicReference::<String>::nil());
    let writer = {
        let reference = reference.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(1));
            reference.set(Some("ready".to_string()));
        })
    };

    let observed = reference.await_cond(ref_equal("ready".to_string()), ONE_HOUR, ONE_HOUR);
    writer.join().unwrap();
    assert_eq!(observed.as_deref().map(String::as_str), Some("ready"));
}

#[test]
fn test_reference_nil_round_trip_under_contention() {
    let reference = Arc::new(AtomicReference::new(Some(0u64)));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let reference = reference.clone();
            thread::spawn(move || {
                for j in 0..1000u64 {
                    if j % 2 == 0 {
                        reference.set(None);
                    } else {
                        reference.set(Some(i * 1000 + j));
                    }
                    // Reads never fail, nil or not
                    let _ = reference.get();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    reference.set(None);
    assert!(reference.is_nil());
}
