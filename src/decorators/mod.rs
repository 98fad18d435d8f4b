//! Stackable cross-cutting wrappers around fallible operations.
//!
//! Ownership model:
//! - `Operation` is the uniform call capability every wrapper implements.
//! - Each wrapper owns the operation it decorates and its own state (a cache
//!   owns its entries, a timer its counters); nothing is shared globally.
//! - Stacking is explicit: `op.timed().retried(policy)?` retries the timed
//!   operation, so the timer observes every attempt while the retrier sees
//!   each failure the timer passes through.

use std::borrow::Cow;
use std::time::Duration;

use crate::config::RetryPolicy;
use crate::errors::AnalyticsError;

/// Idempotent result caching with a time-to-live.
pub mod cache;
/// Privacy redaction of sensitive fields.
pub mod redact;
/// Retry with a fixed inter-attempt delay.
pub mod retry;
/// Wall-clock timing instrumentation.
pub mod timer;

pub use cache::{Cache, CacheEntry, CacheKey};
pub use redact::{Redact, Redactor};
pub use retry::Retrier;
pub use timer::{Timer, TimingStats};

/// A named, fallible operation taking `A` by value.
pub trait Operation<A> {
    /// Value produced on success.
    type Output;

    /// Stable operation name used in logs and errors.
    fn name(&self) -> &str;

    /// Invoke the operation once.
    fn call(&self, args: A) -> Result<Self::Output, AnalyticsError>;
}

/// Adapts a plain function or closure into an [`Operation`].
pub struct FnOperation<F> {
    name: Cow<'static, str>,
    func: F,
}

impl<F> FnOperation<F> {
    /// Wrap `func` under `name`.
    pub fn new(name: impl Into<Cow<'static, str>>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<A, T, F> Operation<A> for FnOperation<F>
where
    F: Fn(A) -> Result<T, AnalyticsError>,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: A) -> Result<T, AnalyticsError> {
        (self.func)(args)
    }
}

/// Fluent constructors for stacking decorators in an explicit order.
///
/// Each method wraps `self`; the last call is the outermost layer.
pub trait OperationExt: Sized {
    /// Wrap in a [`Timer`].
    fn timed(self) -> Timer<Self> {
        Timer::new(self)
    }

    /// Wrap in a [`Retrier`]; fails when `policy` allows no attempts.
    fn retried(self, policy: RetryPolicy) -> Result<Retrier<Self>, AnalyticsError> {
        Retrier::new(self, policy)
    }

    /// Wrap in a [`Cache`] whose entries live for `ttl`.
    fn cached<V>(self, ttl: Duration) -> Cache<Self, V> {
        Cache::new(self, ttl)
    }

    /// Wrap in a [`Redactor`] using the default sensitive fields.
    fn redacted(self) -> Redactor<Self> {
        Redactor::new(self)
    }
}

impl<F> OperationExt for FnOperation<F> {}
impl<O> OperationExt for Timer<O> {}
impl<O> OperationExt for Retrier<O> {}
impl<O, V> OperationExt for Cache<O, V> {}
impl<O> OperationExt for Redactor<O> {}
