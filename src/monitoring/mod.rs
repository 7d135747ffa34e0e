/*!
 * Monitoring
 * Structured tracing setup
 */

mod tracer;

pub use tracer::{init_tracing, TracingConfig, TRACE_JSON_ENV};
