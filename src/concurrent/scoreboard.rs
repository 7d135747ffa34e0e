/*!
 * Scoreboard
 *
 * A sharded map of named atomic counters. Each key routes to one of a fixed
 * number of independently locked shards, so updates to keys on different
 * shards never contend.
 *
 * # Sparse Representation
 *
 * A key whose score is zero takes up no space: `set(key, 0)`, or any `add`
 * that lands on zero, removes it. Reading an absent key yields zero. This
 * keeps per-client tallies (outstanding requests and the like) compact.
 *
 * # Consistency
 *
 * Operations on a single key are linearizable. `view()`, `len()` and
 * `clear()` visit the shards one at a time; the resulting snapshot reflects
 * each shard as of the moment it was visited, not one global instant.
 */

use super::condition::{greater_than_or_equal, less_than_or_equal};
use super::context::Context;
use super::notify::Notifier;
use super::wait::await_value;
use crate::core::errors::{ConfigError, ConfigResult};
use crate::core::limits::{check_interval, DEFAULT_CONCURRENCY};
use crate::core::shard_manager::{ShardManager, WorkloadProfile};
use ahash::RandomState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Scoreboard construction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardConfig {
    /// Number of shards; fixed for the life of the scoreboard
    pub concurrency: usize,
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ScoreboardConfig {
    /// Shard count derived from the CPU count
    pub fn auto(profile: WorkloadProfile) -> Self {
        Self {
            concurrency: ShardManager::shards(profile),
        }
    }

    /// A single shard: one lock for every key
    pub const fn single() -> Self {
        Self { concurrency: 1 }
    }

    /// Reject configurations that cannot route keys
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            warn!("Rejected scoreboard configuration with zero shards");
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// One lock and one notifier per shard
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
struct Shard {
    counters: Mutex<HashMap<String, i64, RandomState>>,
    notifier: Arc<Notifier>,
}

impl Shard {
    fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::with_hasher(RandomState::new())),
            notifier: Arc::new(Notifier::new()),
        }
    }

    fn add(&self, key: &str, amount: i64) -> i64 {
        let updated = {
            let mut counters = self.counters.lock();
            match counters.get_mut(key) {
                Some(score) => {
                    *score = score.wrapping_add(amount);
                    let updated = *score;
                    if updated == 0 {
                        counters.remove(key);
                    }
                    updated
                }
                None => {
                    if amount != 0 {
                        counters.insert(key.to_owned(), amount);
                    }
                    amount
                }
            }
        };
        // Signalled outside the shard lock
        self.notifier.notify();
        updated
    }

    fn set(&self, key: &str, value: i64) {
        {
            let mut counters = self.counters.lock();
            if value == 0 {
                counters.remove(key);
            } else if let Some(score) = counters.get_mut(key) {
                *score = value;
            } else {
                counters.insert(key.to_owned(), value);
            }
        }
        self.notifier.notify();
    }

    fn get(&self, key: &str) -> i64 {
        self.counters.lock().get(key).copied().unwrap_or(0)
    }

    fn view_into(&self, view: &mut HashMap<String, i64>) {
        let counters = self.counters.lock();
        view.extend(counters.iter().map(|(key, score)| (key.clone(), *score)));
    }

    fn len(&self) -> usize {
        self.counters.lock().len()
    }

    fn clear(&self) {
        self.counters.lock().clear();
        self.notifier.notify();
    }
}

/// Sharded map of atomic counters where zero scores take no space
///
/// # Example
///
/// ```
/// use stdkit::concurrent::Scoreboard;
///
/// let board = Scoreboard::new();
/// board.inc("client-a");
/// board.add("client-b", 3);
/// board.dec("client-a");
///
/// // client-a is back at zero and no longer stored
/// assert_eq!(board.get("client-a"), 0);
/// assert_eq!(board.view().len(), 1);
/// ```
pub struct Scoreboard {
    shards: Box<[Shard]>,
}

impl Scoreboard {
    /// Create a scoreboard with the default 16 shards
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_CONCURRENCY)
    }

    /// Create a scoreboard with `concurrency` shards
    ///
    /// Shards are allocated up front: more concurrency trades memory for
    /// less contention, provided keys are well distributed.
    pub fn with_concurrency(concurrency: usize) -> ConfigResult<Self> {
        Self::from_config(&ScoreboardConfig { concurrency })
    }

    /// Create a scoreboard from a configuration
    pub fn from_config(config: &ScoreboardConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_shards(config.concurrency))
    }

    fn with_shards(count: usize) -> Self {
        Self {
            shards: (0..count).map(|_| Shard::new()).collect(),
        }
    }

    /// Number of shards
    #[inline]
    pub fn concurrency(&self) -> usize {
        self.shards.len()
    }

    /// Shard index owning `key`
    ///
    /// `AHasher::default()` uses fixed keys, so routing is stable for the
    /// life of the process and independent of insertion order.
    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = ahash::AHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Add `amount` to the score for `key`, returning the updated score
    pub fn add(&self, key: &str, amount: i64) -> i64 {
        self.shard(key).add(key, amount)
    }

    /// Increment the score for `key`, returning the updated score
    pub fn inc(&self, key: &str) -> i64 {
        self.add(key, 1)
    }

    /// Decrement the score for `key`, returning the updated score
    pub fn dec(&self, key: &str) -> i64 {
        self.add(key, -1)
    }

    /// Current score for `key` (zero if absent)
    pub fn get(&self, key: &str) -> i64 {
        self.shard(key).get(key)
    }

    /// Current score as a native signed integer (truncating on 32-bit targets)
    pub fn get_int(&self, key: &str) -> isize {
        self.get(key) as isize
    }

    /// Set the score for `key`; zero removes the key
    pub fn set(&self, key: &str, value: i64) {
        self.shard(key).set(key, value);
    }

    /// Remove every key
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    /// Snapshot of every non-zero score, taken one shard at a time
    pub fn view(&self) -> HashMap<String, i64> {
        let mut view = HashMap::new();
        for shard in self.shards.iter() {
            shard.view_into(&mut view);
        }
        view
    }

    /// Number of non-zero scores (weakly consistent, like `view`)
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Whether every score is zero (weakly consistent, like `view`)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until the score for `key` is at least `at_least`, or `timeout` elapses
    pub fn fill(
        &self,
        key: &str,
        at_least: i64,
        timeout: Duration,
        interval: impl Into<Option<Duration>>,
    ) -> i64 {
        self.await_cond(key, greater_than_or_equal(at_least), timeout, interval)
    }

    /// Block until the score for `key` is at most `at_most`, or `timeout` elapses
    pub fn drain(
        &self,
        key: &str,
        at_most: i64,
        timeout: Duration,
        interval: impl Into<Option<Duration>>,
    ) -> i64 {
        self.await_cond(key, less_than_or_equal(at_most), timeout, interval)
    }

    /// Block until `cond` holds for the score of `key` or `timeout` elapses,
    /// returning the last observed score
    pub fn await_cond<C>(
        &self,
        key: &str,
        cond: C,
        timeout: Duration,
        interval: impl Into<Option<Duration>>,
    ) -> i64
    where
        C: Fn(i64) -> bool,
    {
        let ctx = Context::with_timeout(&Context::background(), timeout);
        self.await_ctx(&ctx, key, cond, interval)
    }

    /// Block until `cond` holds for the score of `key` or `ctx` finishes,
    /// returning the last observed score
    ///
    /// Wakes on any update to the key's shard, then re-reads the key.
    pub fn await_ctx<C>(
        &self,
        ctx: &Context,
        key: &str,
        cond: C,
        interval: impl Into<Option<Duration>>,
    ) -> i64
    where
        C: Fn(i64) -> bool,
    {
        let shard = self.shard(key);
        await_value(
            &shard.notifier,
            ctx,
            check_interval(interval.into()),
            || shard.get(key),
            |score| cond(*score),
        )
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sorted: BTreeMap<_, _> = self.view().into_iter().collect();
        write!(f, "Scoreboard[{:?}]", sorted)
    }
}

impl fmt::Debug for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoreboard")
            .field("concurrency", &self.concurrency())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrent::condition::equal;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_basic_operations() {
        let board = Scoreboard::new();
        assert_eq!(board.concurrency(), DEFAULT_CONCURRENCY);

        assert_eq!(board.inc("a"), 1);
        assert_eq!(board.add("a", 4), 5);
        assert_eq!(board.dec("b"), -1);
        board.set("c", 9);

        assert_eq!(board.get("a"), 5);
        assert_eq!(board.get_int("b"), -1);
        assert_eq!(board.get("c"), 9);
        assert_eq!(board.get("missing"), 0);
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn test_zero_scores_are_not_stored() {
        let board = Scoreboard::new();
        board.inc("a");
        board.dec("a");
        assert!(board.is_empty());

        board.set("b", 3);
        board.set("b", 0);
        assert!(board.view().is_empty());

        // Adding zero to an absent key stores nothing
        assert_eq!(board.add("c", 0), 0);
        assert!(board.is_empty());
    }

    #[test]
    fn test_clear() {
        let board = Scoreboard::with_concurrency(4).unwrap();
        for i in 0..100 {
            board.inc(&format!("key-{}", i));
        }
        assert_eq!(board.len(), 100);
        board.clear();
        assert!(board.is_empty());
        assert_eq!(board.get("key-7"), 0);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(
            Scoreboard::with_concurrency(0),
            Err(ConfigError::ZeroConcurrency)
        ));
    }

    #[test]
    fn test_routing_is_stable() {
        let board = Scoreboard::with_concurrency(7).unwrap();
        for key in ["a", "b", "some-longer-key", ""] {
            let first = board.shard_index(key);
            assert!(first < 7);
            assert_eq!(board.shard_index(key), first);
        }
    }

    #[test]
    fn test_shard_distribution() {
        let board = Scoreboard::with_concurrency(8).unwrap();
        for i in 0..1000 {
            board.inc(&format!("key-{}", i));
        }

        // Each shard should hold roughly 1000/8 = 125 keys
        for shard in board.shards.iter() {
            let count = shard.len();
            assert!(count > 50 && count < 250, "Bad distribution: {}", count);
        }
    }

    #[test]
    fn test_display_sorted() {
        let board = Scoreboard::new();
        board.set("b", 2);
        board.set("a", 1);
        assert_eq!(board.to_string(), r#"Scoreboard[{"a": 1, "b": 2}]"#);
    }

    #[test]
    fn test_auto_config() {
        let config = ScoreboardConfig::auto(WorkloadProfile::HighContention);
        let board = Scoreboard::from_config(&config).unwrap();
        assert!(board.concurrency().is_power_of_two());
        assert_eq!(ScoreboardConfig::single().concurrency, 1);
    }

    #[test]
    fn test_fill_wakes_on_update() {
        let board = Arc::new(Scoreboard::new());
        let writer = {
            let board = board.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(1));
                board.add("k", 3);
            })
        };

        let start = Instant::now();
        assert_eq!(board.fill("k", 3, Duration::from_secs(3600), Duration::from_secs(3600)), 3);
        assert!(start.elapsed() < Duration::from_secs(10));
        writer.join().unwrap();
    }

    #[test]
    fn test_await_timeout_returns_last_score() {
        let board = Scoreboard::new();
        board.set("k", 2);
        assert_eq!(board.await_cond("k", equal(5), Duration::from_millis(20), None), 2);
        assert_eq!(board.drain("k", 1, Duration::from_millis(20), None), 2);
    }

    /// Update `key` from another thread while `held` is locked; true if it completed
    fn completes_while_locked(board: &Arc<Scoreboard>, held: &str, key: &str) -> bool {
        let guard = board.shard(held).counters.lock();
        let (done_tx, done_rx) = mpsc::channel();
        let writer = {
            let board = board.clone();
            let key = key.to_string();
            thread::spawn(move || {
                board.inc(&key);
                let _ = done_tx.send(());
            })
        };

        let completed = done_rx.recv_timeout(Duration::from_millis(200)).is_ok();
        drop(guard);
        writer.join().unwrap();
        completed
    }

    #[test]
    fn test_distinct_shards_do_not_contend() {
        let board = Arc::new(Scoreboard::with_concurrency(16).unwrap());
        let held = "held";
        let other = (0..)
            .map(|i| format!("key-{}", i))
            .find(|key| board.shard_index(key) != board.shard_index(held))
            .unwrap();

        assert!(completes_while_locked(&board, held, &other));
        assert_eq!(board.get(&other), 1);
    }

    #[test]
    fn test_single_shard_serializes_keys() {
        let board = Arc::new(Scoreboard::with_concurrency(1).unwrap());
        assert_eq!(board.shard_index("held"), board.shard_index("other"));

        assert!(!completes_while_locked(&board, "held", "other"));
        // Released once the lock drops
        assert_eq!(board.get("other"), 1);
    }
}
