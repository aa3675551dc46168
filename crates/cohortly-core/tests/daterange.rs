use chrono::{Duration, NaiveDate};

use cohortly_core::daterange::{bucket_sequence, days_between, parse_date};
use cohortly_core::{build_range_sequence, format_range, AnalyticsError, DateRange, Granularity};

#[test]
fn format_range_renders_month_abbreviations() {
    assert_eq!(
        format_range("2023-01-01", "2023-01-31").expect("valid dates"),
        "Jan 1, 2023 - Jan 31, 2023"
    );
    assert_eq!(
        format_range("2022-12-25", "2023-02-05").expect("valid dates"),
        "Dec 25, 2022 - Feb 5, 2023"
    );
}

#[test]
fn format_range_rejects_unparseable_dates() {
    assert_eq!(
        format_range("2023-01-01", "someday"),
        Err(AnalyticsError::InvalidDate("someday".to_string()))
    );
    assert!(matches!(
        format_range("01/01/2023", "2023-01-31"),
        Err(AnalyticsError::InvalidDate(_))
    ));
}

#[test]
fn label_matches_format_range() {
    let range = DateRange::parse("2023-01-01", "2023-01-31").expect("range");
    assert_eq!(range.label(), "Jan 1, 2023 - Jan 31, 2023");
    assert_eq!(range.days(), 31);
}

#[test]
fn daily_sequence_is_inclusive() {
    assert_eq!(
        build_range_sequence("2023-01-01", "2023-01-03", Granularity::Day).expect("sequence"),
        vec!["2023-01-01", "2023-01-02", "2023-01-03"]
    );
}

#[test]
fn single_day_range_has_one_bucket() {
    assert_eq!(
        build_range_sequence("2023-06-15", "2023-06-15", Granularity::Day).expect("sequence"),
        vec!["2023-06-15"]
    );
    assert_eq!(
        build_range_sequence("2023-06-15", "2023-06-15", Granularity::Week).expect("sequence"),
        vec!["2023-06-15"]
    );
}

#[test]
fn weekly_sequence_rounds_partial_weeks_up() {
    let weeks =
        build_range_sequence("2023-01-01", "2023-01-15", Granularity::Week).expect("sequence");
    assert_eq!(weeks, vec!["2023-01-01", "2023-01-08", "2023-01-15"]);

    let exact =
        build_range_sequence("2023-01-01", "2023-01-14", Granularity::Week).expect("sequence");
    assert_eq!(exact.len(), 2);
}

#[test]
fn daily_sequence_has_no_gaps_across_leap_day() {
    let start = parse_date("2024-02-20").expect("date");
    let end = parse_date("2024-03-10").expect("date");
    let keys = bucket_sequence(start, end, Granularity::Day).expect("sequence");

    assert_eq!(keys.len() as i64, days_between(start, end) + 1);
    let dates: Vec<NaiveDate> = keys
        .iter()
        .map(|key| parse_date(key).expect("bucket key is a date"))
        .collect();
    for pair in dates.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::days(1));
    }
    assert!(keys.contains(&"2024-02-29".to_string()));
}

#[test]
fn daily_sequence_length_matches_day_count_for_many_ranges() {
    let base = parse_date("2023-01-01").expect("date");
    for span in [0i64, 1, 6, 7, 30, 59, 365] {
        let end = base + Duration::days(span);
        let keys = bucket_sequence(base, end, Granularity::Day).expect("sequence");
        assert_eq!(keys.len() as i64, span + 1, "span {span}");
        let weeks = bucket_sequence(base, end, Granularity::Week).expect("sequence");
        assert_eq!(weeks.len() as i64, (span + 1 + 6) / 7, "span {span}");
    }
}

#[test]
fn reversed_range_is_rejected_before_bucketing() {
    assert!(matches!(
        build_range_sequence("2023-01-10", "2023-01-01", Granularity::Day),
        Err(AnalyticsError::InvalidRange { .. })
    ));
}
