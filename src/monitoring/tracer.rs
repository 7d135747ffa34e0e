/*!
 * Structured Tracing
 * Subscriber setup for the `tracing` events emitted by this crate
 *
 * Features:
 * - Explicit configuration struct, no implicit global settings
 * - JSON-formatted logs for structured parsing
 * - Human-readable compact output for development
 */

use crate::core::errors::TracingError;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Environment variable enabling JSON output in [`TracingConfig::from_env`]
pub const TRACE_JSON_ENV: &str = "STDKIT_TRACE_JSON";

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// `EnvFilter` directives, e.g. `info` or `stdkit=trace`
    pub filter: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Include thread ids and names (useful when debugging waiters)
    pub with_threads: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            with_threads: true,
        }
    }
}

impl TracingConfig {
    /// Settings read from the environment
    ///
    /// - `RUST_LOG`: filter directives (default: info)
    /// - `STDKIT_TRACE_JSON`: `1` or `true` for JSON output
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            filter: std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or(defaults.filter),
            json: std::env::var(TRACE_JSON_ENV)
                .map(|v| v == "1" || v == "true")
                .unwrap_or(false),
            ..defaults
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        EnvFilter::try_new(&self.filter).map_err(|e| TracingError::InvalidFilter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Install the global tracing subscriber described by `config`
///
/// Fails rather than panicking if a subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TracingError> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    let installed = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(config.with_threads)
                    .with_thread_names(config.with_threads)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(config.with_threads)
                    .with_thread_names(config.with_threads)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    installed.map_err(|e| TracingError::AlreadyInstalled(e.to_string()))?;
    info!(filter = %config.filter, json = config.json, "Structured tracing initialized");
    Ok(())
}
