/*!
 * Deadline Watcher
 *
 * Fires a trigger if an operation fails to complete in time. The watcher
 * thread waits on a timeout context; `end()` cancels that context, and the
 * trigger only runs when the deadline, not the cancellation, finished it.
 */

use crate::concurrent::{timeout, AtomicCounter, Context, DoneReason};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// What a trigger is told about the missed deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherInfo {
    /// Name of the watched operation
    pub operation: String,
    /// Deadline the operation overran
    pub duration: Duration,
}

/// Fires a trigger when an operation overruns its deadline
///
/// Ending or dropping the watcher before the deadline disarms it.
///
/// # Example
///
/// ```
/// use stdkit::diags::{log_trigger, Watcher};
/// use std::time::Duration;
///
/// let watcher = Watcher::watch("load config", Duration::from_secs(5), log_trigger());
/// // ... the operation ...
/// watcher.end();
/// assert!(!watcher.fired());
/// ```
#[derive(Debug)]
pub struct Watcher {
    info: Arc<WatcherInfo>,
    done: Context,
    fired: Arc<AtomicCounter>,
}

impl Watcher {
    /// Start watching `operation`; `trigger` runs on a background thread if
    /// `duration` passes before `end()`
    pub fn watch<F>(operation: impl Into<String>, duration: Duration, trigger: F) -> Self
    where
        F: FnOnce(&WatcherInfo) + Send + 'static,
    {
        let info = Arc::new(WatcherInfo {
            operation: operation.into(),
            duration,
        });
        let done = timeout(&Context::background(), duration);
        let fired = Arc::new(AtomicCounter::default());

        {
            let info = Arc::clone(&info);
            let done = done.clone();
            let fired = Arc::clone(&fired);
            thread::spawn(move || {
                if done.wait() == DoneReason::DeadlineExceeded {
                    fired.inc();
                    trigger(&info);
                }
            });
        }

        Self { info, done, fired }
    }

    /// The watched operation
    pub fn operation(&self) -> &str {
        &self.info.operation
    }

    /// The deadline measured from `watch`
    pub fn duration(&self) -> Duration {
        self.info.duration
    }

    /// Disarm the watcher, unless it has already fired; idempotent
    pub fn end(&self) {
        self.done.cancel();
    }

    /// Whether the trigger has started running
    pub fn fired(&self) -> bool {
        self.fired.get() > 0
    }

    /// Block until the trigger starts or `timeout` elapses; returns `fired()`
    pub fn await_fired(&self, timeout: Duration) -> bool {
        self.fired.fill(1, timeout, None) > 0
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.end();
    }
}

/// Trigger that logs the overrun at warn level
pub fn log_trigger() -> impl FnOnce(&WatcherInfo) + Send + 'static {
    |info: &WatcherInfo| {
        warn!(
            operation = %info.operation,
            duration = ?info.duration,
            "Operation '{}' took longer than {:?}",
            info.operation,
            info.duration
        );
    }
}
