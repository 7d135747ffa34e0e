/*!
 * Atomic Counter
 *
 * A lock-free `i64` cell with atomic arithmetic and compare-and-swap, plus
 * blocking waits on a condition over its value. Shared between threads by
 * handle (`Arc<AtomicCounter>`).
 */

use super::condition::{greater_than_or_equal, less_than_or_equal};
use super::context::Context;
use super::notify::Notifier;
use super::wait::await_value;
use crate::core::limits::check_interval;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Atomically updated `i64` with condition-based waiting
///
/// Arithmetic wraps on overflow. All reads observe a value written by some
/// `set`, `add` or successful `compare_and_swap`; there are no torn reads.
///
/// # Example
///
/// ```
/// use stdkit::concurrent::AtomicCounter;
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// let pending = Arc::new(AtomicCounter::new(1));
/// let worker = {
///     let pending = pending.clone();
///     thread::spawn(move || pending.dec())
/// };
///
/// // Wakes as soon as the worker decrements, not after the interval
/// let left = pending.drain(0, Duration::from_secs(10), Duration::from_secs(3600));
/// assert_eq!(left, 0);
/// worker.join().unwrap();
/// ```
#[derive(Debug)]
pub struct AtomicCounter {
    value: AtomicI64,
    notifier: Arc<Notifier>,
}

impl AtomicCounter {
    /// Create a counter holding `initial`
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
            notifier: Arc::new(Notifier::new()),
        }
    }

    /// Current value
    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Current value as a native signed integer (truncating on 32-bit targets)
    #[inline]
    pub fn get_int(&self) -> isize {
        self.get() as isize
    }

    /// Add `amount`, returning the updated value
    #[inline]
    pub fn add(&self, amount: i64) -> i64 {
        let updated = self
            .value
            .fetch_add(amount, Ordering::SeqCst)
            .wrapping_add(amount);
        self.notifier.notify();
        updated
    }

    /// Increment, returning the updated value
    #[inline]
    pub fn inc(&self) -> i64 {
        self.add(1)
    }

    /// Decrement, returning the updated value
    #[inline]
    pub fn dec(&self) -> i64 {
        self.add(-1)
    }

    /// Store `value`
    #[inline]
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::SeqCst);
        self.notifier.notify();
    }

    /// Store `replacement` if the current value is `expected`
    ///
    /// Returns whether the swap happened. Waiters are notified only on success.
    #[inline]
    pub fn compare_and_swap(&self, expected: i64, replacement: i64) -> bool {
        let swapped = self
            .value
            .compare_exchange(expected, replacement, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if swapped {
            self.notifier.notify();
        }
        swapped
    }

    /// Block until the value is at least `at_least`, or `timeout` elapses
    pub fn fill(
        &self,
        at_least: i64,
        timeout: Duration,
        interval: impl Into<Option<Duration>>,
    ) -> i64 {
        self.await_cond(greater_than_or_equal(at_least), timeout, interval)
    }

    /// Block until the value is at most `at_most`, or `timeout` elapses
    pub fn drain(
        &self,
        at_most: i64,
        timeout: Duration,
        interval: impl Into<Option<Duration>>,
    ) -> i64 {
        self.await_cond(less_than_or_equal(at_most), timeout, interval)
    }

    /// Block until `cond` holds or `timeout` elapses, returning the last observed value
    ///
    /// `interval` (default 10ms) bounds the time between checks when no update
    /// is signalled. The result does not say whether `cond` held; re-apply it
    /// if the difference matters.
    pub fn await_cond<C>(
        &self,
        cond: C,
        timeout: Duration,
        interval: impl Into<Option<Duration>>,
    ) -> i64
    where
        C: Fn(i64) -> bool,
    {
        let ctx = Context::with_timeout(&Context::background(), timeout);
        self.await_ctx(&ctx, cond, interval)
    }

    /// Block until `cond` holds or `ctx` finishes, returning the last observed value
    pub fn await_ctx<C>(&self, ctx: &Context, cond: C, interval: impl Into<Option<Duration>>) -> i64
    where
        C: Fn(i64) -> bool,
    {
        await_value(
            &self.notifier,
            ctx,
            check_interval(interval.into()),
            || self.get(),
            |value| cond(*value),
        )
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl From<i64> for AtomicCounter {
    fn from(initial: i64) -> Self {
        Self::new(initial)
    }
}

impl fmt::Display for AtomicCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomicCounter[{}]", self.get())
    }
}
