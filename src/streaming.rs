//! Fixed-window streaming analysis.
//!
//! `ChunkedStreamAnalyzer` pulls at most `chunk_size` records from its source
//! per window and folds them into running counters as they arrive. No window
//! buffer is kept, so peak memory does not grow with the collection.

use std::borrow::Borrow;
use std::iter::FusedIterator;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::data::{Gender, PilgrimRecord, PilgrimType};
use crate::errors::AnalyticsError;
use crate::types::Distribution;

/// Earliest arrival and latest departure observed in one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// Earliest arrival.
    pub start: DateTime<Utc>,
    /// Latest departure.
    pub end: DateTime<Utc>,
}

/// Per-window counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChunkStatistics {
    /// Records in the window.
    pub total_pilgrims: usize,
    /// Mean age over the window.
    pub avg_age: f64,
    /// Male records.
    pub male_count: usize,
    /// Female records.
    pub female_count: usize,
    /// Hajj records.
    pub hajj_count: usize,
    /// Umrah records.
    pub umrah_count: usize,
    /// Counts keyed by nationality label, in first-seen order.
    pub by_nationality: Distribution,
}

/// Summary emitted once per window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkSummary {
    /// 1-based window index.
    pub chunk_id: usize,
    /// Number of records in this window; equals the configured size except possibly for the last window.
    pub chunk_size: usize,
    /// Time span covered by the window.
    pub date_range: DateRange,
    /// Counters folded over the window.
    pub statistics: ChunkStatistics,
}

#[derive(Default)]
struct WindowAccumulator {
    count: usize,
    age_sum: u64,
    male: usize,
    female: usize,
    hajj: usize,
    umrah: usize,
    by_nationality: Distribution,
    span: Option<DateRange>,
}

impl WindowAccumulator {
    fn push(&mut self, record: &PilgrimRecord) {
        self.count += 1;
        self.age_sum += u64::from(record.age);
        match record.gender {
            Gender::Male => self.male += 1,
            Gender::Female => self.female += 1,
        }
        match record.pilgrim_type {
            PilgrimType::Hajj => self.hajj += 1,
            PilgrimType::Umrah => self.umrah += 1,
        }
        *self
            .by_nationality
            .entry(record.nationality.label().to_string())
            .or_default() += 1;
        self.span = Some(match self.span {
            None => DateRange {
                start: record.arrival_date,
                end: record.departure_date,
            },
            Some(span) => DateRange {
                start: span.start.min(record.arrival_date),
                end: span.end.max(record.departure_date),
            },
        });
    }

    fn finish(self, chunk_id: usize) -> Option<ChunkSummary> {
        let date_range = self.span?;
        Some(ChunkSummary {
            chunk_id,
            chunk_size: self.count,
            date_range,
            statistics: ChunkStatistics {
                total_pilgrims: self.count,
                avg_age: self.age_sum as f64 / self.count as f64,
                male_count: self.male,
                female_count: self.female,
                hajj_count: self.hajj,
                umrah_count: self.umrah,
                by_nationality: self.by_nationality,
            },
        })
    }
}

/// Splits a record sequence into consecutive windows of `chunk_size` and
/// yields one [`ChunkSummary`] per window.
///
/// The source is consumed exactly once, in order. An empty source yields no
/// windows.
pub struct ChunkedStreamAnalyzer<I> {
    source: I,
    chunk_size: usize,
    emitted: usize,
    exhausted: bool,
}

impl<I> ChunkedStreamAnalyzer<I>
where
    I: Iterator,
    I::Item: Borrow<PilgrimRecord>,
{
    /// Wrap `source`; fails when `chunk_size` is zero.
    pub fn new<S>(source: S, chunk_size: usize) -> Result<Self, AnalyticsError>
    where
        S: IntoIterator<IntoIter = I>,
    {
        if chunk_size == 0 {
            return Err(AnalyticsError::Configuration(
                "chunk_size must be at least 1".into(),
            ));
        }
        Ok(Self {
            source: source.into_iter(),
            chunk_size,
            emitted: 0,
            exhausted: false,
        })
    }

    /// Configured window size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of windows emitted so far.
    pub fn windows_emitted(&self) -> usize {
        self.emitted
    }
}

impl<I> Iterator for ChunkedStreamAnalyzer<I>
where
    I: Iterator,
    I::Item: Borrow<PilgrimRecord>,
{
    type Item = ChunkSummary;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let mut window = WindowAccumulator::default();
        while window.count < self.chunk_size {
            match self.source.next() {
                Some(record) => window.push(Borrow::<PilgrimRecord>::borrow(&record)),
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        let summary = window.finish(self.emitted + 1)?;
        self.emitted += 1;
        debug!(
            chunk_id = summary.chunk_id,
            chunk_size = summary.chunk_size,
            "analyzed chunk"
        );
        Some(summary)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            return (0, Some(0));
        }
        let (lower, upper) = self.source.size_hint();
        (
            lower.div_ceil(self.chunk_size),
            upper.map(|upper| upper.div_ceil(self.chunk_size)),
        )
    }
}

impl<I> FusedIterator for ChunkedStreamAnalyzer<I>
where
    I: Iterator,
    I::Item: Borrow<PilgrimRecord>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RecordGenerator;

    fn records(n: usize) -> Vec<PilgrimRecord> {
        RecordGenerator::with_seed(n, 11).collect()
    }

    #[test]
    fn window_count_is_ceiling_of_len_over_chunk() {
        for (m, c) in [(10, 3), (9, 3), (1, 5), (5, 1), (0, 4)] {
            let data = records(m);
            let summaries: Vec<_> = ChunkedStreamAnalyzer::new(&data, c).unwrap().collect();
            assert_eq!(summaries.len(), m.div_ceil(c), "m={m} c={c}");
            for (idx, summary) in summaries.iter().enumerate() {
                assert_eq!(summary.chunk_id, idx + 1);
                let expected = if idx + 1 < summaries.len() || m % c == 0 {
                    c
                } else {
                    m % c
                };
                assert_eq!(summary.chunk_size, expected);
            }
            let total: usize = summaries.iter().map(|s| s.chunk_size).sum();
            assert_eq!(total, m);
        }
    }

    #[test]
    fn statistics_match_the_window_contents() {
        let data = records(25);
        let summaries: Vec<_> = ChunkedStreamAnalyzer::new(data.iter(), 10).unwrap().collect();
        for (summary, window) in summaries.iter().zip(data.chunks(10)) {
            let stats = &summary.statistics;
            assert_eq!(stats.total_pilgrims, window.len());
            assert_eq!(stats.male_count + stats.female_count, window.len());
            assert_eq!(stats.hajj_count + stats.umrah_count, window.len());
            assert_eq!(stats.by_nationality.values().sum::<usize>(), window.len());

            let expected_avg =
                window.iter().map(|r| f64::from(r.age)).sum::<f64>() / window.len() as f64;
            assert!((stats.avg_age - expected_avg).abs() < 1e-9);

            let start = window.iter().map(|r| r.arrival_date).min().unwrap();
            let end = window.iter().map(|r| r.departure_date).max().unwrap();
            assert_eq!(summary.date_range, DateRange { start, end });
        }
    }

    #[test]
    fn consumes_owned_generator_lazily() {
        let mut analyzer = ChunkedStreamAnalyzer::new(RecordGenerator::with_seed(7, 3), 3).unwrap();
        assert_eq!(analyzer.size_hint(), (3, Some(3)));
        assert_eq!(analyzer.next().unwrap().chunk_size, 3);
        assert_eq!(analyzer.windows_emitted(), 1);
        assert_eq!(analyzer.by_ref().count(), 2);
        assert!(analyzer.next().is_none());
        assert!(analyzer.next().is_none());
    }

    #[test]
    fn empty_input_yields_no_windows() {
        let data: Vec<PilgrimRecord> = Vec::new();
        let mut analyzer = ChunkedStreamAnalyzer::new(&data, 100).unwrap();
        assert!(analyzer.next().is_none());
        assert_eq!(analyzer.windows_emitted(), 0);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let data = records(3);
        assert!(matches!(
            ChunkedStreamAnalyzer::new(&data, 0),
            Err(AnalyticsError::Configuration(_))
        ));
    }
}
