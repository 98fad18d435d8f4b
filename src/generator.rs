//! Lazy synthetic record generation.
//!
//! `RecordGenerator` is a finite, non-restartable iterator: each `next` call
//! draws one record. Nothing is materialized unless the caller collects.

use std::iter::FusedIterator;

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::constants::generator::{
    ARRIVAL_MAX_DAYS_AGO, ARRIVAL_MIN_DAYS_AGO, MAX_AGE, MAX_STAY_DAYS, MIN_AGE, MIN_STAY_DAYS,
    NAME_POOL, PHONE_PREFIX, PROGRESS_INTERVAL, RECORD_ID_PREFIX,
};
use crate::data::{Gender, HealthStatus, Nationality, PilgrimRecord, PilgrimType};
use crate::types::RecordId;

/// Lazily produces exactly `count` synthetic pilgrim records.
pub struct RecordGenerator {
    rng: StdRng,
    count: usize,
    produced: usize,
    /// Anchor for arrival dates; captured once so a run is internally consistent.
    now: DateTime<Utc>,
}

impl RecordGenerator {
    /// Create a generator seeded from fresh randomness.
    pub fn new(count: usize) -> Self {
        Self::with_seed(count, rand::random())
    }

    /// Create a deterministic generator; equal seeds yield equal field draws.
    pub fn with_seed(count: usize, seed: u64) -> Self {
        info!(count, "generating synthetic pilgrim records");
        Self {
            rng: StdRng::seed_from_u64(seed),
            count,
            produced: 0,
            now: Utc::now(),
        }
    }

    /// Override the instant arrival dates are measured back from.
    pub fn anchored_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Total number of records this generator yields.
    pub fn target(&self) -> usize {
        self.count
    }

    /// Number of records produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    fn next_record(&mut self) -> PilgrimRecord {
        let rng = &mut self.rng;
        let days_ago = rng.random_range(ARRIVAL_MIN_DAYS_AGO..=ARRIVAL_MAX_DAYS_AGO);
        let stay = rng.random_range(MIN_STAY_DAYS..=MAX_STAY_DAYS);
        let arrival_date = self.now - TimeDelta::days(days_ago);
        let departure_date = arrival_date + TimeDelta::days(stay);

        PilgrimRecord {
            id: record_id(self.produced),
            national_id: rng.random_range(1_000_000_000u64..=9_999_999_999).to_string(),
            passport_number: format!("P{}", rng.random_range(10_000_000u32..=99_999_999)),
            name: pick(rng, &NAME_POOL).to_string(),
            age: rng.random_range(MIN_AGE..=MAX_AGE),
            gender: pick(rng, &Gender::ALL),
            nationality: pick(rng, &Nationality::ALL),
            phone: format!(
                "{PHONE_PREFIX}{}",
                rng.random_range(500_000_000u32..=599_999_999)
            ),
            pilgrim_type: pick(rng, &PilgrimType::ALL),
            arrival_date,
            departure_date,
            accommodation_id: format!("ACC{}", rng.random_range(1_000u16..=9_999)),
            transport_id: format!("TRN{}", rng.random_range(100u16..=999)),
            health_status: pick(rng, &HealthStatus::ALL),
        }
    }
}

impl Iterator for RecordGenerator {
    type Item = PilgrimRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.produced >= self.count {
            return None;
        }
        let record = self.next_record();
        self.produced += 1;
        if self.produced % PROGRESS_INTERVAL == 0 {
            info!(produced = self.produced, "generated records");
        }
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.produced;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RecordGenerator {}

impl FusedIterator for RecordGenerator {}

/// Format the id for the `seq`-th generated record.
pub fn record_id(seq: usize) -> RecordId {
    format!("{RECORD_ID_PREFIX}{seq:08}")
}

fn pick<T: Copy>(rng: &mut StdRng, pool: &[T]) -> T {
    // Pools are non-empty constants.
    *pool.choose(rng).unwrap_or(&pool[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn yields_exactly_count_records() {
        for count in [0usize, 1, 7, 250] {
            let generator = RecordGenerator::with_seed(count, 11);
            assert_eq!(generator.len(), count);
            assert_eq!(generator.count(), count);
        }
    }

    #[test]
    fn ids_are_unique_prefixed_and_monotonic() {
        let records: Vec<PilgrimRecord> = RecordGenerator::with_seed(300, 5).collect();
        let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), records.len());
        assert_eq!(records[0].id, "PIL00000000");
        assert_eq!(records[299].id, "PIL00000299");
        assert!(records.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[test]
    fn fields_stay_within_domains() {
        let now = Utc::now();
        for record in RecordGenerator::with_seed(500, 9).anchored_at(now) {
            assert!((MIN_AGE..=MAX_AGE).contains(&record.age));
            assert!(record.departure_date > record.arrival_date);
            let days_ago = (now - record.arrival_date).num_days();
            assert!((ARRIVAL_MIN_DAYS_AGO..=ARRIVAL_MAX_DAYS_AGO).contains(&days_ago));
            assert!((MIN_STAY_DAYS..=MAX_STAY_DAYS).contains(&record.stay_days()));
            assert_eq!(record.national_id.len(), 10);
            assert!(record.passport_number.starts_with('P'));
            assert_eq!(record.passport_number.len(), 9);
            assert!(record.phone.starts_with("+9665"));
            assert!(NAME_POOL.contains(&record.name.as_str()));
            assert!(record.accommodation_id.starts_with("ACC"));
            assert!(record.transport_id.starts_with("TRN"));
        }
    }

    #[test]
    fn same_seed_and_anchor_reproduce_records() {
        let now = Utc::now();
        let a: Vec<_> = RecordGenerator::with_seed(20, 77).anchored_at(now).collect();
        let b: Vec<_> = RecordGenerator::with_seed(20, 77).anchored_at(now).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn exhausted_generator_stays_exhausted() {
        let mut generator = RecordGenerator::with_seed(2, 1);
        assert!(generator.next().is_some());
        assert!(generator.next().is_some());
        assert!(generator.next().is_none());
        assert!(generator.next().is_none());
        assert_eq!(generator.produced(), 2);
        assert_eq!(generator.target(), 2);
    }
}
