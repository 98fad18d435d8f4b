use std::collections::HashSet;

use chrono::{TimeDelta, TimeZone, Utc};

use pilgrim_analytics::RecordGenerator;
use pilgrim_analytics::generator::record_id;

#[test]
fn yields_exactly_n_records_for_every_n() {
    for n in [0usize, 1, 2, 17, 1_000, 10_001] {
        let generator = RecordGenerator::with_seed(n, n as u64);
        assert_eq!(generator.len(), n);
        assert_eq!(generator.count(), n);
    }
}

#[test]
fn ids_are_unique_and_ages_in_range() {
    let records: Vec<_> = RecordGenerator::new(5_000).collect();
    let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), records.len());
    assert!(records.iter().all(|r| (18..=80).contains(&r.age)));
    assert_eq!(records[0].id, "PIL00000000");
    assert_eq!(records[4_999].id, record_id(4_999));
}

#[test]
fn dates_follow_the_stay_window() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    for record in RecordGenerator::with_seed(2_000, 99).anchored_at(now) {
        assert!(record.departure_date > record.arrival_date);
        assert!(record.arrival_date <= now - TimeDelta::days(1));
        assert!(record.arrival_date >= now - TimeDelta::days(30));
        assert!((5..=15).contains(&record.stay_days()));
    }
}

#[test]
fn a_drained_generator_stays_empty() {
    let mut generator = RecordGenerator::with_seed(3, 1);
    assert_eq!(generator.by_ref().count(), 3);
    assert_eq!(generator.produced(), 3);
    assert!(generator.next().is_none());
}

#[test]
fn sensitive_identifiers_are_well_formed() {
    for record in RecordGenerator::with_seed(500, 4) {
        assert_eq!(record.national_id.len(), 10);
        assert!(record.national_id.chars().all(|ch| ch.is_ascii_digit()));
        assert!(record.passport_number.starts_with('P'));
        assert_eq!(record.passport_number.len(), 9);
        assert!(record.phone.starts_with("+9665"));
    }
}
