//! Scatter/gather aggregation over a shared, read-only record collection.
//!
//! A [`ParallelAggregator`] owns a fixed-size worker pool for its whole life.
//! Each call to [`ParallelAggregator::aggregate`] fans the given tasks out
//! across the pool, blocks until all of them finish or fail, and merges the
//! outcomes by task name.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use indexmap::IndexMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::aggregation::{
    AGE_BUCKETS, DAY_KEY_FORMAT, SHUTDOWN_WAIT_MS, TASK_AGE_GROUPS, TASK_NATIONALITY,
    TASK_PEAK_PERIODS, WORKER_THREAD_PREFIX,
};
use crate::data::PilgrimRecord;
use crate::decorators::{FnOperation, Operation, Timer};
use crate::errors::AnalyticsError;
use crate::types::{Distribution, TaskName};

/// An independent, read-only aggregation over the full collection.
pub trait Aggregation: Send + Sync {
    /// Key under which the result is merged.
    fn name(&self) -> &str;

    /// Produce a distribution whose counts sum to `records.len()`.
    fn aggregate(&self, records: &[PilgrimRecord]) -> Result<Distribution, AnalyticsError>;
}

/// Counts per nationality label, in first-seen order.
#[derive(Clone, Copy, Debug, Default)]
pub struct NationalityDistribution;

impl Aggregation for NationalityDistribution {
    fn name(&self) -> &str {
        TASK_NATIONALITY
    }

    fn aggregate(&self, records: &[PilgrimRecord]) -> Result<Distribution, AnalyticsError> {
        let mut counts = Distribution::new();
        for record in records {
            *counts
                .entry(record.nationality.label().to_string())
                .or_default() += 1;
        }
        Ok(counts)
    }
}

/// Counts per fixed age bucket. Every bucket is present, even when empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct AgeGroupDistribution;

impl AgeGroupDistribution {
    /// Label of the bucket `age` falls into.
    pub fn bucket_for(age: u8) -> &'static str {
        AGE_BUCKETS
            .iter()
            .find(|(_, upper)| age <= *upper)
            .map(|(label, _)| *label)
            .unwrap_or(AGE_BUCKETS[AGE_BUCKETS.len() - 1].0)
    }
}

impl Aggregation for AgeGroupDistribution {
    fn name(&self) -> &str {
        TASK_AGE_GROUPS
    }

    fn aggregate(&self, records: &[PilgrimRecord]) -> Result<Distribution, AnalyticsError> {
        let mut counts: Distribution = AGE_BUCKETS
            .iter()
            .map(|(label, _)| (label.to_string(), 0))
            .collect();
        for record in records {
            *counts
                .entry(Self::bucket_for(record.age).to_string())
                .or_default() += 1;
        }
        Ok(counts)
    }
}

/// Arrivals per calendar day (`YYYY-MM-DD`), oldest day first.
#[derive(Clone, Copy, Debug, Default)]
pub struct DailyArrivals;

impl Aggregation for DailyArrivals {
    fn name(&self) -> &str {
        TASK_PEAK_PERIODS
    }

    fn aggregate(&self, records: &[PilgrimRecord]) -> Result<Distribution, AnalyticsError> {
        let mut counts = Distribution::new();
        for record in records {
            *counts
                .entry(record.arrival_date.format(DAY_KEY_FORMAT).to_string())
                .or_default() += 1;
        }
        counts.sort_keys();
        Ok(counts)
    }
}

/// The three built-in tasks, in report order.
pub fn default_tasks() -> Vec<Box<dyn Aggregation>> {
    vec![
        Box::new(NationalityDistribution),
        Box::new(AgeGroupDistribution),
        Box::new(DailyArrivals),
    ]
}

/// Merged outcome of one aggregation round.
///
/// `results` has one key per submitted task, in submission order. A failed
/// task maps to `None` (serialized as `null`), which is distinct from an
/// empty distribution produced over zero records.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregationReport {
    /// Outcome per task, in submission order.
    pub results: IndexMap<TaskName, Option<Distribution>>,
    /// Failure reason per failed task.
    pub failures: IndexMap<TaskName, String>,
}

impl AggregationReport {
    /// Result of `task`, if it ran and succeeded.
    pub fn get(&self, task: &str) -> Option<&Distribution> {
        self.results.get(task).and_then(Option::as_ref)
    }

    /// Returns `true` when every task succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
struct WorkerExits {
    exited: Mutex<usize>,
    cvar: Condvar,
}

/// Reusable fixed-size worker pool for [`Aggregation`] tasks.
///
/// The pool is acquired in [`ParallelAggregator::new`] and released by
/// [`ParallelAggregator::shutdown`] or on drop, whichever comes first.
pub struct ParallelAggregator {
    pool: Option<ThreadPool>,
    workers: usize,
    exits: Arc<WorkerExits>,
}

impl ParallelAggregator {
    /// Start `workers` named worker threads.
    pub fn new(workers: usize) -> Result<Self, AnalyticsError> {
        if workers == 0 {
            return Err(AnalyticsError::Configuration(
                "workers must be at least 1".into(),
            ));
        }
        let exits = Arc::new(WorkerExits::default());
        let on_exit = Arc::clone(&exits);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("{WORKER_THREAD_PREFIX}-{idx}"))
            .exit_handler(move |_| {
                let mut exited = on_exit.exited.lock().expect("worker exits poisoned");
                *exited += 1;
                on_exit.cvar.notify_all();
            })
            .build()
            .map_err(|err| {
                AnalyticsError::Configuration(format!("failed to build worker pool: {err}"))
            })?;
        info!(workers, "aggregator pool started");
        Ok(Self {
            pool: Some(pool),
            workers,
            exits,
        })
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns `true` once [`ParallelAggregator::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.pool.is_none()
    }

    /// Run every task concurrently over `records` and merge the outcomes.
    ///
    /// Blocks until all tasks have finished. A task that errors or panics is
    /// recorded as `None` without affecting its siblings.
    pub fn aggregate(
        &self,
        records: &[PilgrimRecord],
        tasks: &[Box<dyn Aggregation>],
    ) -> Result<AggregationReport, AnalyticsError> {
        let pool = self.pool.as_ref().ok_or(AnalyticsError::PoolShutdown)?;

        let mut seen = HashSet::with_capacity(tasks.len());
        for task in tasks {
            if !seen.insert(task.name()) {
                return Err(AnalyticsError::Configuration(format!(
                    "duplicate aggregation task name '{}'",
                    task.name()
                )));
            }
        }

        debug!(
            tasks = tasks.len(),
            records = records.len(),
            "dispatching aggregation tasks"
        );
        let (tx, rx) = mpsc::channel();
        pool.scope(move |scope| {
            for (idx, task) in tasks.iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = run_task(&**task, records);
                    // The receiver outlives the scope.
                    let _ = tx.send((idx, outcome));
                });
            }
        });

        let mut outcomes: Vec<Option<Result<Distribution, AnalyticsError>>> =
            (0..tasks.len()).map(|_| None).collect();
        for (idx, outcome) in rx {
            outcomes[idx] = Some(outcome);
        }

        let mut report = AggregationReport::default();
        for (task, outcome) in tasks.iter().zip(outcomes) {
            let name = task.name().to_string();
            let outcome = outcome.unwrap_or_else(|| {
                Err(AnalyticsError::TaskFailed {
                    task: name.clone(),
                    reason: "task produced no result".into(),
                })
            });
            match outcome {
                Ok(distribution) => {
                    report.results.insert(name, Some(distribution));
                }
                Err(err) => {
                    warn!(task = %name, error = %err, "aggregation task failed");
                    report.failures.insert(name.clone(), err.to_string());
                    report.results.insert(name, None);
                }
            }
        }
        info!(
            succeeded = report.results.len() - report.failures.len(),
            failed = report.failures.len(),
            "parallel aggregation complete"
        );
        Ok(report)
    }

    /// Release the worker pool and wait for its threads to exit.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn shutdown(&mut self) {
        let Some(pool) = self.pool.take() else {
            return;
        };
        drop(pool);
        let workers = self.workers;
        let exited = self.exits.exited.lock().expect("worker exits poisoned");
        let (exited, wait) = self
            .exits
            .cvar
            .wait_timeout_while(exited, Duration::from_millis(SHUTDOWN_WAIT_MS), |exited| {
                *exited < workers
            })
            .expect("worker exits poisoned");
        if wait.timed_out() {
            warn!(
                exited = *exited,
                workers,
                "timed out waiting for aggregator workers to exit"
            );
        } else {
            info!(workers, "aggregator pool shut down");
        }
    }
}

impl Drop for ParallelAggregator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_task(
    task: &dyn Aggregation,
    records: &[PilgrimRecord],
) -> Result<Distribution, AnalyticsError> {
    let timed = Timer::new(FnOperation::new(task.name().to_string(), |_: ()| {
        task.aggregate(records)
    }));
    match panic::catch_unwind(AssertUnwindSafe(|| timed.call(()))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(AnalyticsError::TaskFailed {
            task: task.name().to_string(),
            reason: format!("task panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".into()
    }
}
