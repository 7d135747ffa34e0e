/*!
 * Diagnostics
 * Helpers for spotting operations that overrun their expected duration
 */

mod watcher;

pub use watcher::{log_trigger, Watcher, WatcherInfo};
