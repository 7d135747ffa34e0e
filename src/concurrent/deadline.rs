/*!
 * Deadline
 *
 * Debounce gate: runs a guarded action at most once per interval, however
 * many threads race to run it.
 *
 * # State
 *
 * Two informal states. *Lapsed*: more than `interval` has passed since the
 * last run, and the next `try_run` races to claim the slot. *Fresh*: within
 * the interval; `try_run` returns `false` without attempting the claim.
 *
 * The claim is a compare-and-swap of the last-run timestamp (Unix
 * nanoseconds in an `AtomicCounter`) from the value read to "now". Exactly
 * one racing caller wins and runs the action synchronously; freshness is
 * measured from the claim, not from the action's completion.
 */

use super::counter::AtomicCounter;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock time as signed Unix nanoseconds (saturating at the i64 range)
fn to_unix_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|nanos| -nanos)
            .unwrap_or(i64::MIN),
    }
}

fn from_unix_nanos(nanos: i64) -> SystemTime {
    let magnitude = Duration::from_nanos(nanos.unsigned_abs());
    if nanos >= 0 {
        UNIX_EPOCH + magnitude
    } else {
        UNIX_EPOCH - magnitude
    }
}

/// Compare-and-swap over wall-clock timestamps
#[derive(Debug)]
struct TimestampCell {
    nanos: AtomicCounter,
}

impl TimestampCell {
    fn new(initial: SystemTime) -> Self {
        Self {
            nanos: AtomicCounter::new(to_unix_nanos(initial)),
        }
    }

    fn get(&self) -> SystemTime {
        from_unix_nanos(self.nanos.get())
    }

    fn compare_and_swap(&self, expected: SystemTime, replacement: SystemTime) -> bool {
        self.nanos
            .compare_and_swap(to_unix_nanos(expected), to_unix_nanos(replacement))
    }

    /// Run `f` only if the swap succeeds
    fn if_swapped<F: FnOnce()>(&self, expected: SystemTime, replacement: SystemTime, f: F) -> bool {
        if self.compare_and_swap(expected, replacement) {
            f();
            true
        } else {
            false
        }
    }

    fn set(&self, time: SystemTime) {
        self.nanos.set(to_unix_nanos(time));
    }
}

/// Runs a task at most once per interval
///
/// Thread-safe; share it by reference or `Arc`.
///
/// # Example
///
/// ```
/// use stdkit::concurrent::Deadline;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let flush = Deadline::new(Duration::from_secs(60));
/// assert!(flush.try_run(|| println!("flushing")));
/// assert!(!flush.try_run(|| unreachable!()));
///
/// // Force the next attempt through
/// flush.move_to(UNIX_EPOCH);
/// assert!(flush.lapsed());
/// ```
#[derive(Debug)]
pub struct Deadline {
    last_run: TimestampCell,
    interval: Duration,
}

impl Deadline {
    /// Create a deadline that has never run, and is therefore lapsed
    pub fn new(interval: Duration) -> Self {
        Self {
            last_run: TimestampCell::new(UNIX_EPOCH),
            interval,
        }
    }

    /// Minimum time between runs
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `f` if the deadline has lapsed and this caller wins the claim
    ///
    /// Returns whether `f` ran.
    pub fn try_run<F: FnOnce()>(&self, f: F) -> bool {
        let now = SystemTime::now();
        let last = self.last();
        if Self::exceeds(now, last, self.interval) {
            return self.last_run.if_swapped(last, now, f);
        }
        false
    }

    /// Time of the last run; `UNIX_EPOCH` if it never ran
    #[inline]
    pub fn last(&self) -> SystemTime {
        self.last_run.get()
    }

    /// Time since the last run (zero if the marker is in the future)
    pub fn elapsed(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.last())
            .unwrap_or(Duration::ZERO)
    }

    /// Whether more than `interval` has passed since the last run
    pub fn lapsed(&self) -> bool {
        Self::exceeds(SystemTime::now(), self.last(), self.interval)
    }

    /// Reposition the last-run marker
    ///
    /// `UNIX_EPOCH` forces the next `try_run` through; a time in the future
    /// suppresses runs until `interval` past it.
    pub fn move_to(&self, time: SystemTime) {
        self.last_run.set(time);
    }

    fn exceeds(now: SystemTime, last: SystemTime, interval: Duration) -> bool {
        now.duration_since(last)
            .map(|elapsed| elapsed > interval)
            .unwrap_or(false)
    }
}
