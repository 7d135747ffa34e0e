/*!
 * Atomic Reference
 *
 * A lock-free slot holding an optional shared referent, with the same
 * condition-based waiting as `AtomicCounter`.
 *
 * # Design: Nil Is a Value
 *
 * The slot is an `ArcSwapOption`, so `None` (nil) is an ordinary, atomically
 * storable state rather than "never initialised". Reads never fail and
 * `set(None)` is as valid as any other update.
 */

use super::context::Context;
use super::notify::Notifier;
use super::wait::await_value;
use crate::core::limits::check_interval;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Atomically replaced `Option<Arc<T>>` with condition-based waiting
///
/// Conditions see the referent as `Option<&T>`; see
/// [`ref_equal`](super::condition::ref_equal), [`ref_nil`](super::condition::ref_nil)
/// and [`ref_not`](super::condition::ref_not).
pub struct AtomicReference<T> {
    value: ArcSwapOption<T>,
    notifier: Arc<Notifier>,
}

impl<T> AtomicReference<T> {
    /// Create a reference holding `initial` (`None` for nil)
    pub fn new(initial: Option<T>) -> Self {
        Self {
            value: ArcSwapOption::new(initial.map(Arc::new)),
            notifier: Arc::new(Notifier::new()),
        }
    }

    /// Create a reference holding nil
    pub fn nil() -> Self {
        Self::new(None)
    }

    /// Current referent
    #[inline]
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.load_full()
    }

    /// Whether the current referent is nil
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.value.load().is_none()
    }

    /// Store a new referent (`None` for nil)
    #[inline]
    pub fn set(&self, referent: Option<T>) {
        self.set_arc(referent.map(Arc::new));
    }

    /// Store an already shared referent
    #[inline]
    pub fn set_arc(&self, referent: Option<Arc<T>>) {
        self.value.store(referent);
        self.notifier.notify();
    }

    /// Store a new referent, returning the previous one
    #[inline]
    pub fn swap(&self, referent: Option<T>) -> Option<Arc<T>> {
        let previous = self.value.swap(referent.map(Arc::new));
        self.notifier.notify();
        previous
    }

    /// Block until `cond` holds or `timeout` elapses, returning the last observed referent
    ///
    /// `interval` (default 10ms) bounds the time between checks when no update
    /// is signalled.
    pub fn await_cond<C>(
        &self,
        cond: C,
        timeout: Duration,
        interval: impl Into<Option<Duration>>,
    ) -> Option<Arc<T>>
    where
        C: Fn(Option<&T>) -> bool,
    {
        let ctx = Context::with_timeout(&Context::background(), timeout);
        self.await_ctx(&ctx, cond, interval)
    }

    /// Block until `cond` holds or `ctx` finishes, returning the last observed referent
    pub fn await_ctx<C>(
        &self,
        ctx: &Context,
        cond: C,
        interval: impl Into<Option<Duration>>,
    ) -> Option<Arc<T>>
    where
        C: Fn(Option<&T>) -> bool,
    {
        await_value(
            &self.notifier,
            ctx,
            check_interval(interval.into()),
            || self.get(),
            |referent| cond(referent.as_deref()),
        )
    }
}

impl<T> Default for AtomicReference<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T: fmt::Display> fmt::Display for AtomicReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(referent) => write!(f, "{}", referent),
            None => f.write_str("nil"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for AtomicReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicReference")
            .field("value", &self.get())
            .finish()
    }
}
