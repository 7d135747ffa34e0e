/*!
 * Concurrent Primitives
 *
 * Thread-safe counters, references and scoreboards that support blocking
 * "await condition" semantics, plus a debounce gate built on them.
 *
 * # Architecture
 *
 * Every waitable primitive pairs its storage with a [`Notifier`]. Mutators
 * signal it without blocking; waiters wake on the signal, on cancellation
 * of their [`Context`], or on a periodic fallback tick, then re-check their
 * condition against the current value.
 *
 * - [`AtomicCounter`]: lock-free `i64`
 * - [`AtomicReference`]: lock-free optional referent, nil included
 * - [`Scoreboard`]: sharded, sparse map of named counters
 * - [`Deadline`]: at-most-once-per-interval gate over an atomic timestamp
 *
 * # Waiting
 *
 * `await_cond`/`fill`/`drain` take a timeout; `await_ctx` takes a context.
 * All of them return the last observed value, whether or not the condition
 * held. The optional `interval` (default 10ms) bounds the fallback tick.
 */

pub mod condition;
mod context;
mod counter;
mod deadline;
mod notify;
mod reference;
mod scoreboard;
mod wait;

pub use context::{forever, timeout, Context, DoneReason};
pub use counter::AtomicCounter;
pub use deadline::Deadline;
pub use notify::Notifier;
pub use reference::AtomicReference;
pub use scoreboard::{Scoreboard, ScoreboardConfig};

pub use crate::core::limits::{DEFAULT_CHECK_INTERVAL, INDEFINITELY};
