use std::time::Duration;

use crate::constants::defaults::{
    CACHE_TTL_SECS, CHUNK_SIZE, RETRY_ATTEMPTS, RETRY_DELAY_MS, WORKERS,
};
use crate::errors::AnalyticsError;

/// Retry budget for operations wrapped by a `Retrier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of invocations allowed, including the first one.
    pub max_attempts: usize,
    /// Fixed pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with `max_attempts` total attempts and a fixed `delay`.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Reject policies that would never invoke the operation.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.max_attempts == 0 {
            return Err(AnalyticsError::Configuration(
                "retry max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_ATTEMPTS,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

/// Top-level platform configuration.
#[derive(Clone, Debug)]
pub struct AnalyticsConfig {
    /// Window size used by streaming analysis when the caller does not pass one.
    pub chunk_size: usize,
    /// Number of worker threads owned by the parallel aggregator.
    pub workers: usize,
    /// Time-to-live of cached summary results.
    ///
    /// A zero TTL disables reuse: every lookup is treated as expired.
    pub cache_ttl: Duration,
    /// Retry budget applied to record loading.
    pub retry: RetryPolicy,
    /// Optional RNG seed; `None` draws a fresh seed for every load.
    pub seed: Option<u64>,
}

impl AnalyticsConfig {
    /// Fail fast on values that cannot produce a working platform.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.chunk_size == 0 {
            return Err(AnalyticsError::Configuration(
                "chunk_size must be at least 1".into(),
            ));
        }
        if self.workers == 0 {
            return Err(AnalyticsError::Configuration(
                "workers must be at least 1".into(),
            ));
        }
        self.retry.validate()
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            workers: WORKERS,
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            retry: RetryPolicy::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.chunk_size, 5_000);
        assert_eq!(config.workers, 4);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_and_zero_chunk_are_rejected() {
        let config = AnalyticsConfig {
            workers: 0,
            ..AnalyticsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalyticsError::Configuration(msg)) if msg.contains("workers")
        ));

        let config = AnalyticsConfig {
            chunk_size: 0,
            ..AnalyticsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalyticsError::Configuration(msg)) if msg.contains("chunk_size")
        ));
    }

    #[test]
    fn zero_attempt_retry_policy_is_rejected() {
        let config = AnalyticsConfig {
            retry: RetryPolicy::new(0, Duration::ZERO),
            ..AnalyticsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
