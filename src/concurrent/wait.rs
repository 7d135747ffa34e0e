/*!
 * Condition Wait Loop
 *
 * The one waiting protocol behind every `fill`/`drain`/`await_cond`/
 * `await_ctx` in this module:
 *
 * 1. snapshot the notifier generation
 * 2. read the value; return it if the condition holds
 * 3. return it if the context has finished
 * 4. park until an update, a cancellation, the fallback tick or the deadline
 * 5. return the value already read if the context finished meanwhile
 *
 * The value returned is always the last one observed, whether or not the
 * condition held; callers that need to tell success from expiry re-apply
 * the condition to it.
 */

use super::context::Context;
use super::notify::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Wait on `notifier` until `cond(read())` holds or `ctx` finishes
///
/// `interval` bounds the time between re-reads when no update arrives.
pub(crate) fn await_value<V, R, C>(
    notifier: &Arc<Notifier>,
    ctx: &Context,
    interval: Duration,
    mut read: R,
    cond: C,
) -> V
where
    R: FnMut() -> V,
    C: Fn(&V) -> bool,
{
    // Registered lazily: a condition that already holds costs no setup
    let mut registration = None;
    let mut checks: u64 = 0;

    loop {
        let observed = notifier.generation();
        let value = read();
        checks += 1;
        if cond(&value) {
            return value;
        }

        if registration.is_none() {
            registration = Some(ctx.register(notifier));
        }
        if let Some(reason) = ctx.done_reason() {
            trace!(%reason, checks, "Condition wait ended without the condition holding");
            return value;
        }

        let park = ctx
            .remaining()
            .map_or(interval, |remaining| remaining.min(interval));
        notifier.wait(observed, park);

        // A finished context wins over any update that woke us alongside it
        if let Some(reason) = ctx.done_reason() {
            trace!(%reason, checks, "Condition wait ended without the condition holding");
            return value;
        }
    }
}
