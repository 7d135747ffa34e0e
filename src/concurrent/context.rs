/*!
 * Cancellation Contexts
 *
 * A `Context` is a cloneable cancellation token with an optional deadline.
 * Every `await_ctx` operation is driven by one: it returns as soon as its
 * condition holds, its context is cancelled, or its context's deadline
 * passes.
 *
 * # Tree Structure
 *
 * Contexts derive from a parent. A child's deadline is the earlier of its
 * own and its parent's, and cancelling a parent cancels every descendant.
 * Cancelling a child never affects its parent. `Context::background()` is
 * the root: it has no deadline and cannot be cancelled.
 *
 * # Waking Waiters
 *
 * Waiters register their primitive's [`Notifier`] with the context for the
 * duration of the wait, so `cancel()` wakes them immediately instead of at
 * their next fallback tick. Deadlines need no signal: waiters never park
 * past the context's remaining time.
 */

use super::notify::Notifier;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crate::core::limits::INDEFINITELY;

/// Why a context finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoneReason {
    /// `cancel()` was called on this context or an ancestor
    Cancelled,
    /// The deadline passed
    DeadlineExceeded,
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("context cancelled"),
            Self::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

enum Listener {
    Notifier(Arc<Notifier>),
    Child(Weak<ContextInner>),
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

struct ContextInner {
    deadline: Option<Instant>,
    cancellable: bool,
    cancelled: AtomicBool,
    listeners: Mutex<Listeners>,
    /// Parent and our listener id in it, removed again on drop
    parent: Option<(Arc<ContextInner>, u64)>,
}

impl ContextInner {
    fn add_listener(&self, listener: Listener) -> u64 {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, listener));
        id
    }

    fn remove_listener(&self, id: u64) {
        self.listeners.lock().entries.retain(|(entry, _)| *entry != id);
    }

    fn cancel(&self) {
        if !self.cancellable || self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        // Detach the listeners before signalling; a child dropped here
        // would otherwise try to take our lock again.
        let entries = std::mem::take(&mut self.listeners.lock().entries);
        for (_, listener) in entries {
            match listener {
                Listener::Notifier(notifier) => notifier.notify(),
                Listener::Child(child) => {
                    if let Some(child) = child.upgrade() {
                        child.cancel();
                    }
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        if let Some((parent, id)) = &self.parent {
            parent.remove_listener(*id);
        }
    }
}

/// Cancellation token with an optional deadline
///
/// Clones share state: cancelling any clone cancels them all. Dropping a
/// handle does not cancel the context.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Root context: never cancelled, no deadline
    pub fn background() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                cancellable: false,
                cancelled: AtomicBool::new(false),
                listeners: Mutex::new(Listeners::default()),
                parent: None,
            }),
        }
    }

    /// Child context that finishes only when cancelled (or when `parent` finishes)
    pub fn with_cancel(parent: &Context) -> Self {
        Self::derive(parent, None)
    }

    /// Child context that finishes at `deadline` at the latest
    pub fn with_deadline(parent: &Context, deadline: Instant) -> Self {
        Self::derive(parent, Some(deadline))
    }

    /// Child context that finishes `timeout` from now at the latest
    ///
    /// A timeout too large to represent (such as [`INDEFINITELY`]) means no deadline.
    pub fn with_timeout(parent: &Context, timeout: Duration) -> Self {
        Self::derive(parent, Instant::now().checked_add(timeout))
    }

    fn derive(parent: &Context, deadline: Option<Instant>) -> Self {
        let deadline = match (deadline, parent.inner.deadline) {
            (Some(own), Some(inherited)) => Some(own.min(inherited)),
            (own, inherited) => own.or(inherited),
        };

        let inner = if parent.inner.cancellable {
            Arc::new_cyclic(|weak: &Weak<ContextInner>| {
                let id = parent.inner.add_listener(Listener::Child(weak.clone()));
                ContextInner {
                    deadline,
                    cancellable: true,
                    cancelled: AtomicBool::new(false),
                    listeners: Mutex::new(Listeners::default()),
                    parent: Some((Arc::clone(&parent.inner), id)),
                }
            })
        } else {
            Arc::new(ContextInner {
                deadline,
                cancellable: true,
                cancelled: AtomicBool::new(false),
                listeners: Mutex::new(Listeners::default()),
                parent: None,
            })
        };

        // The parent may have been cancelled before our listener was added
        if parent.inner.is_cancelled() {
            inner.cancel();
        }

        Self { inner }
    }

    /// Cancel this context and all of its descendants
    ///
    /// Idempotent. A no-op on the background context.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Deadline, if any (inherited deadlines included)
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline; `None` when there is no deadline
    #[inline]
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Why the context finished, or `None` while it is still live
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn done_reason(&self) -> Option<DoneReason> {
        if self.inner.is_cancelled() {
            return Some(DoneReason::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DoneReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the context has been cancelled or has expired
    #[inline]
    pub fn is_done(&self) -> bool {
        self.done_reason().is_some()
    }

    /// Block until the context finishes
    ///
    /// Blocks forever on a context that can neither be cancelled nor expire.
    pub fn wait(&self) -> DoneReason {
        let notifier = Arc::new(Notifier::new());
        let _registration = self.register(&notifier);
        loop {
            let observed = notifier.generation();
            if let Some(reason) = self.done_reason() {
                return reason;
            }
            let park = self.remaining().unwrap_or(INDEFINITELY);
            notifier.wait(observed, park);
        }
    }

    /// Have `cancel()` signal `notifier` until the returned guard drops
    pub(crate) fn register(&self, notifier: &Arc<Notifier>) -> Registration<'_> {
        let id = self
            .inner
            .cancellable
            .then(|| self.inner.add_listener(Listener::Notifier(Arc::clone(notifier))));
        Registration { context: self, id }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("cancellable", &self.inner.cancellable)
            .field("done", &self.done_reason())
            .finish()
    }
}

/// Notifier registration, removed on drop
pub(crate) struct Registration<'a> {
    context: &'a Context,
    id: Option<u64>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.context.inner.remove_listener(id);
        }
    }
}

/// Context that expires `timeout` from now, or sooner if `parent` finishes
pub fn timeout(parent: &Context, timeout: Duration) -> Context {
    Context::with_timeout(parent, timeout)
}

/// Context with no deadline of its own; finishes only on cancellation
pub fn forever(parent: &Context) -> Context {
    timeout(parent, INDEFINITELY)
}
