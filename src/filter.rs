use std::borrow::Borrow;
use std::iter::FusedIterator;

use tracing::debug;

use crate::data::{Nationality, PilgrimRecord, PilgrimType};
use crate::errors::AnalyticsError;

/// Criteria for selecting records. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Exact nationality match.
    pub nationality: Option<Nationality>,
    /// Exact visit kind match.
    pub pilgrim_type: Option<PilgrimType>,
    /// Inclusive lower age bound.
    pub min_age: Option<u8>,
    /// Inclusive upper age bound.
    pub max_age: Option<u8>,
}

impl RecordFilter {
    /// Reject criteria that can never match.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if let (Some(min), Some(max)) = (self.min_age, self.max_age)
            && min > max
        {
            return Err(AnalyticsError::Configuration(format!(
                "min_age {min} exceeds max_age {max}"
            )));
        }
        Ok(())
    }

    /// Returns `true` when `record` satisfies every set criterion.
    pub fn matches(&self, record: &PilgrimRecord) -> bool {
        self.nationality.is_none_or(|n| record.nationality == n)
            && self.pilgrim_type.is_none_or(|t| record.pilgrim_type == t)
            && self.min_age.is_none_or(|min| record.age >= min)
            && self.max_age.is_none_or(|max| record.age <= max)
    }

    /// Lazily filter `records`, preserving order.
    pub fn apply<I>(self, records: I) -> Result<FilteredRecords<I::IntoIter>, AnalyticsError>
    where
        I: IntoIterator,
        I::Item: Borrow<PilgrimRecord>,
    {
        self.validate()?;
        debug!(criteria = ?self, "filtering records");
        Ok(FilteredRecords {
            inner: records.into_iter(),
            filter: self,
        })
    }
}

/// Iterator adapter returned by [`RecordFilter::apply`].
pub struct FilteredRecords<I> {
    inner: I,
    filter: RecordFilter,
}

impl<I> Iterator for FilteredRecords<I>
where
    I: Iterator,
    I::Item: Borrow<PilgrimRecord>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        self.inner
            .find(|record| filter.matches(Borrow::<PilgrimRecord>::borrow(record)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl<I> FusedIterator for FilteredRecords<I>
where
    I: FusedIterator,
    I::Item: Borrow<PilgrimRecord>,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RecordGenerator;

    #[test]
    fn empty_filter_matches_everything() {
        let records: Vec<_> = RecordGenerator::with_seed(50, 3).collect();
        let kept = RecordFilter::default().apply(&records).unwrap().count();
        assert_eq!(kept, 50);
    }

    #[test]
    fn combined_criteria_are_conjunctive() {
        let records: Vec<_> = RecordGenerator::with_seed(400, 8).collect();
        let filter = RecordFilter {
            nationality: Some(Nationality::Saudi),
            pilgrim_type: Some(PilgrimType::Hajj),
            min_age: Some(30),
            max_age: Some(50),
        };
        let expected = records
            .iter()
            .filter(|r| {
                r.nationality == Nationality::Saudi
                    && r.pilgrim_type == PilgrimType::Hajj
                    && (30..=50).contains(&r.age)
            })
            .count();
        let kept: Vec<&PilgrimRecord> = filter.apply(&records).unwrap().collect();
        assert_eq!(kept.len(), expected);
        assert!(kept.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[test]
    fn filters_owned_streams_lazily() {
        let filter = RecordFilter {
            min_age: Some(60),
            ..RecordFilter::default()
        };
        let mut stream = filter.apply(RecordGenerator::with_seed(100, 4)).unwrap();
        if let Some(first) = stream.next() {
            assert!(first.age >= 60);
        }
    }

    #[test]
    fn inverted_age_range_is_rejected() {
        let filter = RecordFilter {
            min_age: Some(50),
            max_age: Some(20),
            ..RecordFilter::default()
        };
        assert!(matches!(
            filter.apply(Vec::<PilgrimRecord>::new()),
            Err(AnalyticsError::Configuration(_))
        ));
    }
}
