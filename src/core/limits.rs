/*!
 * Defaults and Limits
 *
 * Centralized location for the default intervals, shard counts and bounds
 * used by the concurrent primitives.
 *
 * ## Conventions
 * - Values are grouped by domain (waiting, sharding)
 * - Performance-sensitive constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// WAITING
// =============================================================================

/// Default upper bound on the time between condition checks (10ms)
/// Used by `fill`/`drain`/`await_cond`/`await_ctx` when no interval is given.
/// [PERF] Only matters when a notification is missed; normal wake-ups are immediate
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Smallest check interval a waiter will honour (1µs)
/// Zero intervals are clamped up to this to avoid a hot spin on the condvar.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_micros(1);

/// The longest representable timeout (approx. 584 billion years)
/// Use where an arbitrarily long wait is needed; deadlines past the end of
/// `Instant`'s range are treated as "no deadline".
pub const INDEFINITELY: Duration = Duration::MAX;

// =============================================================================
// SHARDING
// =============================================================================

/// Default number of scoreboard shards
/// [PERF] Each shard is individually locked and allocated up front
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Lower clamp for CPU-derived shard counts
pub const MIN_AUTO_SHARDS: usize = 8;

/// Upper clamp for CPU-derived shard counts
/// [PERF] Diminishing returns beyond this; every shard costs a cache line plus a map
pub const MAX_AUTO_SHARDS: usize = 512;

/// Resolve an optional per-call check interval against the default, clamping zero.
#[inline]
pub(crate) fn check_interval(interval: Option<Duration>) -> Duration {
    interval
        .unwrap_or(DEFAULT_CHECK_INTERVAL)
        .max(MIN_CHECK_INTERVAL)
}
