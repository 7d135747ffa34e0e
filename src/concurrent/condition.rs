/*!
 * Conditions
 *
 * Predicates tested against the current value of a primitive each time a
 * waiter wakes. Integer conditions apply to counters and scoreboard entries;
 * reference conditions apply to `AtomicReference` referents, where `None`
 * is the nil referent.
 *
 * Any `Fn(i64) -> bool` (or `Fn(Option<&T>) -> bool`) is a condition; the
 * constructors here cover the common cases and compose with [`not`],
 * [`and`] and [`or`].
 */

/// Value equals `target`
#[inline]
pub fn equal(target: i64) -> impl Fn(i64) -> bool + Clone + Send + Sync {
    move |value| value == target
}

/// Value is strictly less than `target`
#[inline]
pub fn less_than(target: i64) -> impl Fn(i64) -> bool + Clone + Send + Sync {
    move |value| value < target
}

/// Value is less than or equal to `target`
#[inline]
pub fn less_than_or_equal(target: i64) -> impl Fn(i64) -> bool + Clone + Send + Sync {
    move |value| value <= target
}

/// Value is strictly greater than `target`
#[inline]
pub fn greater_than(target: i64) -> impl Fn(i64) -> bool + Clone + Send + Sync {
    move |value| value > target
}

/// Value is greater than or equal to `target`
#[inline]
pub fn greater_than_or_equal(target: i64) -> impl Fn(i64) -> bool + Clone + Send + Sync {
    move |value| value >= target
}

/// Logical inverse of `cond`
#[inline]
pub fn not<C>(cond: C) -> impl Fn(i64) -> bool + Clone
where
    C: Fn(i64) -> bool + Clone,
{
    move |value| !cond(value)
}

/// Both conditions hold
#[inline]
pub fn and<A, B>(a: A, b: B) -> impl Fn(i64) -> bool + Clone
where
    A: Fn(i64) -> bool + Clone,
    B: Fn(i64) -> bool + Clone,
{
    move |value| a(value) && b(value)
}

/// Either condition holds
#[inline]
pub fn or<A, B>(a: A, b: B) -> impl Fn(i64) -> bool + Clone
where
    A: Fn(i64) -> bool + Clone,
    B: Fn(i64) -> bool + Clone,
{
    move |value| a(value) || b(value)
}

/// Referent is nil
#[inline]
pub fn ref_nil<T>() -> impl Fn(Option<&T>) -> bool + Clone + Send + Sync {
    |referent: Option<&T>| referent.is_none()
}

/// Referent is present and equals `target`
#[inline]
pub fn ref_equal<T>(target: T) -> impl Fn(Option<&T>) -> bool + Clone
where
    T: PartialEq + Clone,
{
    move |referent: Option<&T>| referent == Some(&target)
}

/// Logical inverse of a reference condition
#[inline]
pub fn ref_not<T, C>(cond: C) -> impl Fn(Option<&T>) -> bool + Clone
where
    C: Fn(Option<&T>) -> bool + Clone,
{
    move |referent: Option<&T>| !cond(referent)
}
