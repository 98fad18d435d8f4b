//! Orchestration over the generator, decorators, streaming analyzer, and
//! parallel aggregator.

use std::path::Path;
use std::slice;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::info;

use crate::aggregator::{Aggregation, ParallelAggregator, default_tasks};
use crate::config::AnalyticsConfig;
use crate::constants::aggregation::TASK_NATIONALITY;
use crate::constants::platform::TOP_NATIONALITIES;
use crate::data::PilgrimRecord;
use crate::decorators::{
    Cache, CacheKey, FnOperation, Operation, OperationExt, Redactor, Retrier, Timer, TimingStats,
};
use crate::errors::AnalyticsError;
use crate::filter::{FilteredRecords, RecordFilter};
use crate::generator::RecordGenerator;
use crate::metrics::{HealthAssessment, SummaryStatistics, assess_health, summarize, top_k};
use crate::report::{AnalysisReport, export_report};
use crate::streaming::ChunkedStreamAnalyzer;
use crate::types::{CacheKeyString, FieldMap};

/// Arguments of the retried load operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    /// Number of records to generate.
    pub count: usize,
    /// Deterministic seed, if any.
    pub seed: Option<u64>,
}

/// Arguments of the cached summary operation.
///
/// Keyed by dataset generation and size, so reloading invalidates any
/// summary computed over the previous collection.
#[derive(Clone, Copy, Debug)]
pub struct SummaryRequest<'a> {
    /// Dataset generation the records belong to.
    pub generation: u64,
    /// Records to summarize.
    pub records: &'a [PilgrimRecord],
}

impl CacheKey for SummaryRequest<'_> {
    fn cache_key(&self) -> CacheKeyString {
        format!("{}|{}", self.generation, self.records.len())
    }
}

type LoadFn = fn(LoadRequest) -> Result<Vec<PilgrimRecord>, AnalyticsError>;
type SummaryFn = for<'a> fn(SummaryRequest<'a>) -> Result<SummaryStatistics, AnalyticsError>;
type HealthFn = fn(FieldMap) -> Result<HealthAssessment, AnalyticsError>;
type AnalysisFn = for<'a, 'b> fn(
    (&'a AnalyticsPlatform, &'b [Box<dyn Aggregation>]),
) -> Result<AnalysisReport, AnalyticsError>;

fn generate(request: LoadRequest) -> Result<Vec<PilgrimRecord>, AnalyticsError> {
    let generator = match request.seed {
        Some(seed) => RecordGenerator::with_seed(request.count, seed),
        None => RecordGenerator::new(request.count),
    };
    Ok(generator.collect())
}

fn summary_of(request: SummaryRequest<'_>) -> Result<SummaryStatistics, AnalyticsError> {
    Ok(summarize(request.records))
}

fn health_of(fields: FieldMap) -> Result<HealthAssessment, AnalyticsError> {
    Ok(assess_health(&fields))
}

fn analyze(
    (platform, tasks): (&AnalyticsPlatform, &[Box<dyn Aggregation>]),
) -> Result<AnalysisReport, AnalyticsError> {
    info!(workers = platform.aggregator.workers(), "running comprehensive analysis");
    let parallel = platform.aggregator.aggregate(&platform.records, tasks)?;
    let summary = platform.summary()?;
    let top_nationalities: IndexMap<_, _> = parallel
        .get(TASK_NATIONALITY)
        .map(|distribution| top_k(distribution, TOP_NATIONALITIES).into_iter().collect())
        .unwrap_or_default();
    Ok(AnalysisReport {
        generated_at: Utc::now().to_rfc3339(),
        summary,
        detailed_analysis: parallel.results,
        top_nationalities,
    })
}

/// Owns the loaded records and the aggregator's worker pool.
///
/// The pool is released by [`AnalyticsPlatform::cleanup`] or, at the latest,
/// when the platform is dropped.
pub struct AnalyticsPlatform {
    config: AnalyticsConfig,
    records: Vec<PilgrimRecord>,
    generation: u64,
    aggregator: ParallelAggregator,
    loader: Retrier<Timer<FnOperation<LoadFn>>>,
    summarizer: Cache<Timer<FnOperation<SummaryFn>>, SummaryStatistics>,
    health: Timer<Redactor<FnOperation<HealthFn>>>,
    analysis: Timer<FnOperation<AnalysisFn>>,
}

impl AnalyticsPlatform {
    /// Validate `config` and start the worker pool.
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        let aggregator = ParallelAggregator::new(config.workers)?;
        let loader = FnOperation::new("load_data", generate as LoadFn)
            .timed()
            .retried(config.retry)?;
        let summarizer = FnOperation::new("summary_statistics", summary_of as SummaryFn)
            .timed()
            .cached(config.cache_ttl);
        let health = FnOperation::new("analyze_health_status", health_of as HealthFn)
            .redacted()
            .timed();
        let analysis = FnOperation::new("comprehensive_analysis", analyze as AnalysisFn).timed();
        info!(
            workers = config.workers,
            chunk_size = config.chunk_size,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "analytics platform ready"
        );
        Ok(Self {
            config,
            records: Vec::new(),
            generation: 0,
            aggregator,
            loader,
            summarizer,
            health,
            analysis,
        })
    }

    /// Configuration the platform was built with.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Generate `count` records, replacing whatever was loaded before.
    ///
    /// Returns the number of records now held.
    pub fn load(&mut self, count: usize) -> Result<usize, AnalyticsError> {
        let records = self.loader.call(LoadRequest {
            count,
            seed: self.config.seed,
        })?;
        self.records = records;
        self.generation += 1;
        info!(
            records = self.records.len(),
            generation = self.generation,
            "records loaded"
        );
        Ok(self.records.len())
    }

    /// The currently loaded collection.
    pub fn records(&self) -> &[PilgrimRecord] {
        &self.records
    }

    /// Number of successful loads so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Summary statistics of the loaded collection, cached for the configured TTL.
    pub fn summary(&self) -> Result<SummaryStatistics, AnalyticsError> {
        self.summarizer.call(SummaryRequest {
            generation: self.generation,
            records: &self.records,
        })
    }

    /// Cache `(hits, misses)` of the summary operation.
    pub fn summary_cache_stats(&self) -> (u64, u64) {
        (self.summarizer.hits(), self.summarizer.misses())
    }

    /// Timing of summary computations. Cache hits are not timed.
    pub fn summary_timing(&self) -> TimingStats {
        self.summarizer.inner().stats()
    }

    /// Timing of load calls, one entry per attempt.
    pub fn load_timing(&self) -> TimingStats {
        self.loader.inner().stats()
    }

    /// Stream the loaded collection in windows of `chunk_size`.
    pub fn stream_analysis(
        &self,
        chunk_size: usize,
    ) -> Result<ChunkedStreamAnalyzer<slice::Iter<'_, PilgrimRecord>>, AnalyticsError> {
        info!(chunk_size, records = self.records.len(), "starting streaming analysis");
        ChunkedStreamAnalyzer::new(&self.records, chunk_size)
    }

    /// Stream the loaded collection using the configured chunk size.
    pub fn stream_default(
        &self,
    ) -> Result<ChunkedStreamAnalyzer<slice::Iter<'_, PilgrimRecord>>, AnalyticsError> {
        self.stream_analysis(self.config.chunk_size)
    }

    /// Stream `count` freshly generated records without materializing them.
    pub fn stream_generated(
        &self,
        count: usize,
        chunk_size: usize,
    ) -> Result<ChunkedStreamAnalyzer<RecordGenerator>, AnalyticsError> {
        let generator = match self.config.seed {
            Some(seed) => RecordGenerator::with_seed(count, seed),
            None => RecordGenerator::new(count),
        };
        ChunkedStreamAnalyzer::new(generator, chunk_size)
    }

    /// Lazily filter the loaded collection.
    pub fn filtered(
        &self,
        filter: RecordFilter,
    ) -> Result<FilteredRecords<slice::Iter<'_, PilgrimRecord>>, AnalyticsError> {
        filter.apply(&self.records)
    }

    /// Run the built-in aggregations and merge them with the summary.
    pub fn comprehensive_analysis(&self) -> Result<AnalysisReport, AnalyticsError> {
        self.comprehensive_analysis_with(&default_tasks())
    }

    /// Same as [`AnalyticsPlatform::comprehensive_analysis`] with caller-chosen tasks.
    pub fn comprehensive_analysis_with(
        &self,
        tasks: &[Box<dyn Aggregation>],
    ) -> Result<AnalysisReport, AnalyticsError> {
        self.analysis.call((self, tasks))
    }

    /// Health view of a field mapping; sensitive fields are redacted first.
    pub fn analyze_health_status(&self, fields: FieldMap) -> Result<HealthAssessment, AnalyticsError> {
        self.health.call(fields)
    }

    /// Health view of one loaded record.
    pub fn analyze_record_health(
        &self,
        record: &PilgrimRecord,
    ) -> Result<HealthAssessment, AnalyticsError> {
        self.analyze_health_status(record.to_fields())
    }

    /// Write `report` as UTF-8 JSON to `path`.
    pub fn export_report(
        &self,
        report: &AnalysisReport,
        path: impl AsRef<Path>,
    ) -> Result<(), AnalyticsError> {
        export_report(report, path)
    }

    /// Release the worker pool. Later aggregation calls fail with
    /// [`AnalyticsError::PoolShutdown`]. Safe to call more than once.
    pub fn cleanup(&mut self) {
        self.aggregator.shutdown();
    }
}

impl Drop for AnalyticsPlatform {
    fn drop(&mut self) {
        self.cleanup();
    }
}
