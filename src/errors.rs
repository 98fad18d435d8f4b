use std::io;

use thiserror::Error;

use crate::types::TaskName;

/// Error type for configuration, operation, aggregation, and export failures.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// An invalid setting or argument.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A wrapped operation failed.
    #[error("operation '{operation}' failed: {reason}")]
    Operation {
        /// Name of the failed operation.
        operation: String,
        /// What went wrong.
        reason: String,
    },
    /// Every allowed attempt failed; `source` is the last failure.
    #[error("operation '{operation}' failed after {attempts} attempts (retries exhausted)")]
    RetriesExhausted {
        /// Name of the retried operation.
        operation: String,
        /// Attempts made.
        attempts: usize,
        /// Failure of the final attempt.
        #[source]
        source: Box<AnalyticsError>,
    },
    /// An aggregation task errored or panicked.
    #[error("aggregation task '{task}' failed: {reason}")]
    TaskFailed {
        /// Name of the failed task.
        task: TaskName,
        /// Error message or panic payload.
        reason: String,
    },
    /// The worker pool was already released.
    #[error("worker pool has been shut down")]
    PoolShutdown,
    /// Filesystem failure during export.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Report encoding failure.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Convenience constructor for a failed operation.
    pub fn operation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when this error is a retry-exhaustion marker.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
