/*!
 * Fault Injection
 *
 * Simulated faults for exercising error paths in tests. A [`FaultSpec`]
 * pairs a [`Contingency`] (when to fail) with the error to report; building
 * it yields a [`Fault`] that tallies invocations and injected faults in
 * atomic counters.
 *
 * Specs are reusable; build a fresh `Fault` per test, since it carries the
 * tallies.
 */

use crate::concurrent::AtomicCounter;
use crate::core::errors::{ConfigError, ConfigResult};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Tallies visible to a contingency when it is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    /// Invocations so far, this one included
    pub calls: i64,
    /// Faults injected before this invocation
    pub faults: i64,
}

/// Condition under which a fault is injected
#[derive(Clone)]
pub struct Contingency(Arc<dyn Fn(&Invocation) -> bool + Send + Sync>);

impl Contingency {
    /// Custom contingency
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Never injects
    pub fn never() -> Self {
        Self::from_fn(|_| false)
    }

    /// Always injects
    pub fn always() -> Self {
        Self::from_fn(|_| true)
    }

    /// Injects with probability `p`
    pub fn random(p: f32) -> ConfigResult<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::InvalidProbability(p.to_string()));
        }
        Ok(Self::from_fn(move |_| rand::random::<f32>() < p))
    }

    /// Injects during the first `n` invocations
    pub fn first(n: i64) -> Self {
        Self::from_fn(move |invocation| invocation.calls <= n)
    }

    /// Injects on every invocation after the first `n`
    pub fn after(n: i64) -> Self {
        Self::from_fn(move |invocation| invocation.calls > n)
    }

    #[inline]
    fn occurs(&self, invocation: &Invocation) -> bool {
        (self.0)(invocation)
    }
}

impl fmt::Debug for Contingency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Contingency")
    }
}

/// When to fail, and with what
#[derive(Debug, Clone)]
pub struct FaultSpec<E> {
    contingency: Contingency,
    error: Option<E>,
}

impl<E: Clone> FaultSpec<E> {
    /// Inject `error` whenever `contingency` occurs
    pub fn new(contingency: Contingency, error: E) -> Self {
        Self {
            contingency,
            error: Some(error),
        }
    }

    /// A spec that never injects
    pub fn none() -> Self {
        Self {
            contingency: Contingency::never(),
            error: None,
        }
    }

    /// Create a fault with fresh tallies
    pub fn build(&self) -> Fault<E> {
        Fault {
            spec: self.clone(),
            calls: AtomicCounter::default(),
            faults: AtomicCounter::default(),
        }
    }
}

impl<E: Clone> Default for FaultSpec<E> {
    fn default() -> Self {
        Self::none()
    }
}

/// Injector of simulated errors; thread-safe
#[derive(Debug)]
pub struct Fault<E> {
    spec: FaultSpec<E>,
    calls: AtomicCounter,
    faults: AtomicCounter,
}

impl<E: Clone> Fault<E> {
    /// Simulate an invocation, failing if the contingency occurs
    pub fn try_call(&self) -> Result<(), E> {
        let invocation = Invocation {
            calls: self.calls.inc(),
            faults: self.faults.get(),
        };
        if !self.spec.contingency.occurs(&invocation) {
            return Ok(());
        }

        self.faults.inc();
        debug!(calls = invocation.calls, "Injecting fault");
        match &self.spec.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Invocations so far, including any still in progress
    pub fn calls(&self) -> i64 {
        self.calls.get()
    }

    /// Faults injected so far
    pub fn faults(&self) -> i64 {
        self.faults.get()
    }
}
