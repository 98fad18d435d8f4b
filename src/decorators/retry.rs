use std::thread;

use tracing::{error, info, warn};

use super::Operation;
use crate::config::RetryPolicy;
use crate::errors::AnalyticsError;

/// Re-invokes a failing operation up to `max_attempts` times in total.
///
/// The wrapped operation must be safe to call repeatedly with the same
/// arguments; that is the caller's contract and is not checked here.
pub struct Retrier<O> {
    inner: O,
    policy: RetryPolicy,
}

impl<O> Retrier<O> {
    /// Wrap `inner` with `policy`. Fails when the policy allows zero attempts.
    pub fn new(inner: O, policy: RetryPolicy) -> Result<Self, AnalyticsError> {
        policy.validate()?;
        Ok(Self { inner, policy })
    }

    /// Configured retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Borrow the wrapped operation.
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<A, O> Operation<A> for Retrier<O>
where
    A: Clone,
    O: Operation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<Self::Output, AnalyticsError> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;
        loop {
            match self.inner.call(args.clone()) {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation = self.inner.name(), attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt >= max_attempts => {
                    error!(
                        operation = self.inner.name(),
                        attempts = attempt,
                        error = %err,
                        "failed after {} attempts",
                        attempt
                    );
                    return Err(AnalyticsError::RetriesExhausted {
                        operation: self.inner.name().to_string(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    warn!(
                        operation = self.inner.name(),
                        attempt,
                        error = %err,
                        "attempt {} failed, retrying",
                        attempt
                    );
                    if !self.policy.delay.is_zero() {
                        thread::sleep(self.policy.delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
