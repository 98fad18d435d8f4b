#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Parallel multi-metric aggregation over a worker pool.
pub mod aggregator;
/// Platform configuration and retry policy.
pub mod config;
/// Centralized constants used across generation, redaction, and aggregation.
pub mod constants;
/// Pilgrim record and enumerated field types.
pub mod data;
/// Stackable timing, retry, caching, and redaction wrappers.
pub mod decorators;
/// Reusable demo runners shared by the demo binaries.
pub mod example_apps;
/// Lazy record filtering.
pub mod filter;
/// Lazy synthetic record generation.
pub mod generator;
mod hash;
/// Summary statistics, top-k views, and health assessment.
pub mod metrics;
/// Orchestrating platform over the whole pipeline.
pub mod platform;
/// Report structure and JSON export.
pub mod report;
/// Fixed-window streaming analysis.
pub mod streaming;
/// Shared type aliases.
pub mod types;

mod errors;

pub use aggregator::{
    AgeGroupDistribution, Aggregation, AggregationReport, DailyArrivals, NationalityDistribution,
    ParallelAggregator, default_tasks,
};
pub use config::{AnalyticsConfig, RetryPolicy};
pub use data::{Gender, HealthStatus, Nationality, PilgrimRecord, PilgrimType};
pub use decorators::{
    Cache, CacheEntry, CacheKey, FnOperation, Operation, OperationExt, Redact, Redactor, Retrier,
    Timer, TimingStats,
};
pub use errors::AnalyticsError;
pub use filter::{FilteredRecords, RecordFilter};
pub use generator::RecordGenerator;
pub use hash::redaction_digest;
pub use metrics::{HealthAssessment, SummaryStatistics};
pub use platform::AnalyticsPlatform;
pub use report::{AnalysisReport, export_report};
pub use streaming::{ChunkStatistics, ChunkSummary, ChunkedStreamAnalyzer, DateRange};
pub use types::{
    CacheKeyString, CategoryLabel, Distribution, FieldMap, FieldName, RecordId,
    TaskName,
};
