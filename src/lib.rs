/*!
 * stdkit
 * In-process concurrent primitives with condition-based waiting
 */

pub mod concurrent;
pub mod core;
pub mod diags;
pub mod fault;
pub mod monitoring;

// Re-exports
pub use concurrent::{
    forever, timeout, AtomicCounter, AtomicReference, Context, Deadline, DoneReason, Scoreboard,
    ScoreboardConfig, INDEFINITELY,
};
pub use crate::core::errors::{ConfigError, ConfigResult, TracingError};
pub use diags::Watcher;
pub use fault::{Contingency, Fault, FaultSpec};
pub use monitoring::{init_tracing, TracingConfig};
