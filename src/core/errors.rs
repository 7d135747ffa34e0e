/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction-time configuration errors
///
/// The primitives themselves never fail once built; every recoverable
/// error in this crate is a misconfiguration caught at construction.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Scoreboard concurrency must be at least 1")]
    #[diagnostic(
        code(config::zero_concurrency),
        help("Use a positive shard count, or ScoreboardConfig::default() for 16 shards.")
    )]
    ZeroConcurrency,

    #[error("Fault probability {0} is outside 0.0..=1.0")]
    #[diagnostic(
        code(config::invalid_probability),
        help("Pass a probability in the range 0.0..=1.0.")
    )]
    InvalidProbability(String),
}

/// Tracing subscriber setup errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum TracingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    #[diagnostic(
        code(tracing::invalid_filter),
        help("Use an EnvFilter directive such as 'info' or 'stdkit=debug'.")
    )]
    InvalidFilter { filter: String, reason: String },

    #[error("Tracing subscriber already installed: {0}")]
    #[diagnostic(
        code(tracing::already_installed),
        help("init_tracing may only succeed once per process.")
    )]
    AlreadyInstalled(String),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
