/*!
 * Update Notifier
 *
 * Wake-on-update signal shared by every waitable primitive. Stands in for a
 * single-slot notification channel: writers signal without blocking, and
 * any number of mutations before a waiter wakes coalesce into one wake-up.
 *
 * # Design: Generation Counter + Condvar
 *
 * Writers bump a generation counter and only touch the condvar when a waiter
 * is parked. Waiters snapshot the generation *before* reading the guarded
 * value and park only while the generation is unchanged, so an update that
 * lands between the read and the park is never lost. Every parked waiter is
 * woken (broadcast); each re-reads the value itself, so the notification
 * carries no payload.
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Coalescing wake-up signal
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
#[derive(Debug, Default)]
pub struct Notifier {
    generation: AtomicU64,
    waiters: AtomicUsize,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl Notifier {
    /// Create a notifier with no pending updates
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            waiters: AtomicUsize::new(0),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    /// Current generation; take this before reading the guarded value
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Signal an update
    ///
    /// Never blocks on the condition being waited for; the internal mutex is
    /// taken only when a waiter is parked, and only for the broadcast.
    #[inline]
    pub fn notify(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }

    /// Park until the generation moves past `observed` or `timeout` elapses
    ///
    /// Returns `true` if an update was signalled. Spurious wake-ups may also
    /// report `true`; callers re-check their condition regardless.
    pub fn wait(&self, observed: u64, timeout: Duration) -> bool {
        self.waiters.fetch_add(1, Ordering::SeqCst);

        let notified = {
            let mut guard = self.mutex.lock();
            if self.generation.load(Ordering::SeqCst) != observed {
                true
            } else {
                !self.condvar.wait_for(&mut guard, timeout).timed_out()
            }
        };

        self.waiters.fetch_sub(1, Ordering::SeqCst);
        notified
    }

    /// Number of parked waiters (for diagnostics)
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_update_before_park_is_not_lost() {
        let notifier = Notifier::new();
        let observed = notifier.generation();
        notifier.notify();

        let start = Instant::now();
        assert!(notifier.wait(observed, Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_times_out() {
        let notifier = Notifier::new();
        let start = Instant::now();
        let notified = notifier.wait(notifier.generation(), Duration::from_millis(50));

        assert!(!notified);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(notifier.waiter_count(), 0);
    }

    #[test]
    fn test_notify_wakes_all_waiters() {
        let notifier = Arc::new(Notifier::new());
        let observed = notifier.generation();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let notifier = notifier.clone();
                thread::spawn(move || {
                    let start = Instant::now();
                    notifier.wait(observed, Duration::from_secs(10));
                    start.elapsed()
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        notifier.notify();

        for handle in handles {
            assert!(handle.join().unwrap() < Duration::from_secs(5));
        }
    }

    #[test]
    fn test_updates_coalesce() {
        let notifier = Notifier::new();
        let before = notifier.generation();
        notifier.notify();
        notifier.notify();
        notifier.notify();

        // One wake-up observes all three
        assert!(notifier.wait(before, Duration::from_secs(1)));
        let after = notifier.generation();
        assert!(!notifier.wait(after, Duration::from_millis(10)));
    }
}
