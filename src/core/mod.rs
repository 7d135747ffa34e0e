/*!
 * Core Module
 * Shared limits, error types and shard sizing
 */

pub mod errors;
pub mod limits;
pub mod shard_manager;

// Re-export for convenience
pub use errors::*;
pub use limits::{DEFAULT_CHECK_INTERVAL, DEFAULT_CONCURRENCY, INDEFINITELY, MIN_CHECK_INTERVAL};
pub use shard_manager::{ShardManager, WorkloadProfile};
