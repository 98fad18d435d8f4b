use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::constants::platform::UNKNOWN_HEALTH_STATUS;
use crate::data::{Gender, HealthStatus, PilgrimRecord, PilgrimType};
use crate::types::{CategoryLabel, Distribution, FieldMap};

/// Whole-collection headline numbers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SummaryStatistics {
    /// Number of records.
    pub total_pilgrims: usize,
    /// Records with [`PilgrimType::Hajj`].
    pub hajj_pilgrims: usize,
    /// Records with [`PilgrimType::Umrah`].
    pub umrah_pilgrims: usize,
    /// Mean age, or `0.0` for an empty collection.
    pub average_age: f64,
    /// Share of male records, 0-100.
    pub male_percentage: f64,
    /// Share of female records, 0-100.
    pub female_percentage: f64,
}

/// Compute [`SummaryStatistics`] over `records`.
///
/// An empty collection yields all-zero statistics.
pub fn summarize(records: &[PilgrimRecord]) -> SummaryStatistics {
    info!(records = records.len(), "calculating summary statistics");
    let total = records.len();
    if total == 0 {
        return SummaryStatistics::default();
    }
    let mut stats = SummaryStatistics {
        total_pilgrims: total,
        ..SummaryStatistics::default()
    };
    let mut age_sum = 0u64;
    let mut male = 0usize;
    let mut female = 0usize;
    for record in records {
        age_sum += u64::from(record.age);
        match record.pilgrim_type {
            PilgrimType::Hajj => stats.hajj_pilgrims += 1,
            PilgrimType::Umrah => stats.umrah_pilgrims += 1,
        }
        match record.gender {
            Gender::Male => male += 1,
            Gender::Female => female += 1,
        }
    }
    let total = total as f64;
    stats.average_age = age_sum as f64 / total;
    stats.male_percentage = male as f64 / total * 100.0;
    stats.female_percentage = female as f64 / total * 100.0;
    stats
}

/// The `k` largest categories, count descending.
///
/// Equal counts are ordered by label so the view is stable across runs.
pub fn top_k(distribution: &Distribution, k: usize) -> Vec<(CategoryLabel, usize)> {
    let mut entries: Vec<(CategoryLabel, usize)> = distribution
        .iter()
        .map(|(label, count)| (label.clone(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(k);
    entries
}

/// Health view of a single field mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthAssessment {
    /// Status label, or `غير محدد` when missing.
    pub status: String,
    /// Set when the status is `يحتاج متابعة`.
    pub requires_attention: bool,
}

/// Read `health_status` from `fields`.
///
/// A missing status is reported as unknown and never requires attention.
pub fn assess_health(fields: &FieldMap) -> HealthAssessment {
    let status = match fields.get("health_status") {
        Some(Value::String(status)) => status.clone(),
        Some(Value::Null) | None => UNKNOWN_HEALTH_STATUS.to_string(),
        Some(other) => other.to_string(),
    };
    let requires_attention = status == HealthStatus::NeedsFollowUp.label();
    HealthAssessment {
        status,
        requires_attention,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RecordGenerator;

    #[test]
    fn summary_counts_are_consistent() {
        let records: Vec<_> = RecordGenerator::with_seed(500, 8).collect();
        let stats = summarize(&records);
        assert_eq!(stats.total_pilgrims, 500);
        assert_eq!(stats.hajj_pilgrims + stats.umrah_pilgrims, 500);
        assert!((stats.male_percentage + stats.female_percentage - 100.0).abs() < 1e-9);
        assert!((18.0..=80.0).contains(&stats.average_age));
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let stats = summarize(&[]);
        assert_eq!(stats, SummaryStatistics::default());
        assert_eq!(stats.average_age, 0.0);
        assert_eq!(stats.male_percentage, 0.0);
    }

    #[test]
    fn top_k_orders_by_count_then_label() {
        let distribution = Distribution::from([
            ("b".to_string(), 3),
            ("a".to_string(), 3),
            ("c".to_string(), 9),
            ("d".to_string(), 1),
        ]);
        let top = top_k(&distribution, 3);
        assert_eq!(
            top,
            vec![("c".to_string(), 9), ("a".to_string(), 3), ("b".to_string(), 3)]
        );
        assert_eq!(top_k(&distribution, 10).len(), 4);
        assert!(top_k(&Distribution::new(), 5).is_empty());
    }

    #[test]
    fn health_assessment_flags_follow_up() {
        let mut fields = FieldMap::new();
        fields.insert("health_status".into(), Value::from("يحتاج متابعة"));
        let assessment = assess_health(&fields);
        assert!(assessment.requires_attention);

        fields.insert("health_status".into(), Value::from("جيد"));
        assert!(!assess_health(&fields).requires_attention);
    }

    #[test]
    fn missing_health_status_is_unknown() {
        let assessment = assess_health(&FieldMap::new());
        assert_eq!(assessment.status, "غير محدد");
        assert!(!assessment.requires_attention);
    }
}
