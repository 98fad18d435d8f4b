use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::info;

use super::Operation;
use crate::errors::AnalyticsError;

/// Counters collected by a [`Timer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimingStats {
    /// Number of completed calls, successful or not.
    pub calls: u64,
    /// Duration of the most recent call.
    pub last: Option<Duration>,
    /// Sum of all call durations.
    pub total: Duration,
}

/// Records the wall-clock duration of every call. Purely observational.
pub struct Timer<O> {
    inner: O,
    stats: Mutex<TimingStats>,
}

impl<O> Timer<O> {
    /// Wrap `inner` with empty counters.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            stats: Mutex::new(TimingStats::default()),
        }
    }

    /// Snapshot of the collected counters.
    pub fn stats(&self) -> TimingStats {
        *self.stats.lock().expect("timer stats poisoned")
    }

    /// Borrow the wrapped operation.
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<A, O> Operation<A> for Timer<O>
where
    O: Operation<A>,
{
    type Output = O::Output;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call(&self, args: A) -> Result<Self::Output, AnalyticsError> {
        let start = Instant::now();
        let result = self.inner.call(args);
        let elapsed = start.elapsed();
        {
            let mut stats = self.stats.lock().expect("timer stats poisoned");
            stats.calls = stats.calls.saturating_add(1);
            stats.last = Some(elapsed);
            stats.total += elapsed;
        }
        info!(
            operation = self.inner.name(),
            elapsed_secs = elapsed.as_secs_f64(),
            ok = result.is_ok(),
            "{} took {:.4} seconds",
            self.inner.name(),
            elapsed.as_secs_f64()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorators::FnOperation;

    #[test]
    fn records_duration_without_changing_result() {
        let timer = Timer::new(FnOperation::new("slow", |_: ()| {
            std::thread::sleep(Duration::from_millis(20));
            Ok("done")
        }));
        assert_eq!(timer.call(()).unwrap(), "done");
        let stats = timer.stats();
        assert_eq!(stats.calls, 1);
        assert!(stats.last.unwrap() >= Duration::from_millis(20));
        assert_eq!(stats.total, stats.last.unwrap());
    }

    #[test]
    fn failures_are_timed_and_propagated_unchanged() {
        let timer = Timer::new(FnOperation::new("fails", |_: ()| -> Result<(), _> {
            Err(AnalyticsError::operation("fails", "nope"))
        }));
        let err = timer.call(()).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Operation { ref reason, .. } if reason == "nope"
        ));
        assert_eq!(timer.stats().calls, 1);
        assert_eq!(timer.inner().name(), "fails");
    }
}
