use cohortly_core::{
    calculate_retention, ActivityRecord, DateRange, Granularity, RetentionQuery, RetentionResponse,
};

fn visit(user: &str, date: &str) -> ActivityRecord {
    ActivityRecord::new(user, date, 1, 60.0)
}

fn offsets(list: &[u32]) -> RetentionQuery {
    RetentionQuery::default().with_offsets(list.to_vec())
}

fn period(response: &RetentionResponse, cohort: &str, offset: u32) -> (f64, u64) {
    let cohort = response
        .cohorts
        .iter()
        .find(|c| c.cohort_key == cohort)
        .expect("cohort present");
    let period = cohort
        .periods
        .iter()
        .find(|p| p.offset == offset)
        .expect("offset present");
    (period.percentage, period.count)
}

#[test]
fn half_of_day_zero_cohort_returns_on_day_one() {
    let records = vec![
        visit("u1", "2023-01-01"),
        visit("u1", "2023-01-02"),
        visit("u2", "2023-01-01"),
    ];
    let response = calculate_retention(&records, &offsets(&[0, 1]));

    assert_eq!(response.cohorts.len(), 1);
    assert_eq!(response.cohorts[0].size, 2);
    assert_eq!(period(&response, "2023-01-01", 0), (100.0, 2));
    assert_eq!(period(&response, "2023-01-01", 1), (50.0, 1));
}

#[test]
fn retention_requires_exact_day_match() {
    // u1 is active on day 6 and day 8 but not on day 7.
    let records = vec![
        visit("u1", "2023-01-01"),
        visit("u1", "2023-01-07"),
        visit("u1", "2023-01-09"),
    ];
    let response = calculate_retention(&records, &offsets(&[0, 7, 8]));

    assert_eq!(period(&response, "2023-01-01", 7), (0.0, 0));
    assert_eq!(period(&response, "2023-01-01", 8), (100.0, 1));
}

#[test]
fn duplicate_records_on_same_day_count_once() {
    let records = vec![
        visit("u1", "2023-01-01"),
        visit("u1", "2023-01-02"),
        visit("u1", "2023-01-02"),
        visit("u2", "2023-01-01"),
        visit("u3", "2023-01-01"),
    ];
    let response = calculate_retention(&records, &offsets(&[1]));

    assert_eq!(period(&response, "2023-01-01", 1), (33.3, 1));
}

#[test]
fn offsets_beyond_observed_data_are_present_and_zero() {
    let records = vec![visit("u1", "2023-01-01"), visit("u2", "2023-01-05")];
    let response = calculate_retention(&records, &RetentionQuery::default());

    assert_eq!(response.offsets, vec![0, 1, 7, 14, 30]);
    for cohort in &response.cohorts {
        let offsets: Vec<u32> = cohort.periods.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 1, 7, 14, 30]);
        assert_eq!(cohort.periods[0].percentage, 100.0);
        assert_eq!(cohort.periods[0].count, cohort.size);
        assert!(cohort.periods[1..].iter().all(|p| p.count == 0 && p.percentage == 0.0));
    }
}

#[test]
fn user_belongs_to_first_seen_cohort_regardless_of_input_order() {
    let records = vec![
        visit("u1", "2023-01-03"),
        visit("u1", "2023-01-01"),
        visit("u2", "2023-01-03"),
    ];
    let response = calculate_retention(&records, &offsets(&[0, 2]));

    let keys: Vec<&str> = response.cohorts.iter().map(|c| c.cohort_key.as_str()).collect();
    assert_eq!(keys, vec!["2023-01-01", "2023-01-03"]);
    assert_eq!(period(&response, "2023-01-01", 2), (100.0, 1));
    assert_eq!(period(&response, "2023-01-03", 0), (100.0, 1));
}

#[test]
fn weekly_cohorts_measure_offsets_from_each_users_first_day() {
    // Both users first appear in the ISO week starting Monday 2023-01-02.
    let records = vec![
        visit("u1", "2023-01-02"),
        visit("u1", "2023-01-03"),
        visit("u2", "2023-01-05"),
        visit("u2", "2023-01-06"),
    ];
    let query = RetentionQuery::default()
        .with_granularity(Granularity::Week)
        .with_offsets(vec![0, 1]);
    let response = calculate_retention(&records, &query);

    assert_eq!(response.cohorts.len(), 1);
    assert_eq!(response.cohorts[0].cohort_key, "2023-01-02");
    assert_eq!(period(&response, "2023-01-02", 1), (100.0, 2));
}

#[test]
fn cohort_range_limits_which_users_form_cohorts() {
    let records = vec![
        visit("early", "2022-12-30"),
        visit("early", "2023-01-01"),
        visit("inside", "2023-01-01"),
        visit("inside", "2023-01-02"),
    ];
    let range = DateRange::parse("2023-01-01", "2023-01-31").expect("range");
    let query = RetentionQuery::default()
        .with_offsets(vec![0, 1])
        .with_cohort_range(range);
    let response = calculate_retention(&records, &query);

    assert_eq!(response.cohorts.len(), 1);
    assert_eq!(response.cohorts[0].size, 1);
    assert_eq!(period(&response, "2023-01-01", 1), (100.0, 1));
}

#[test]
fn malformed_rows_are_skipped_and_counted() {
    let records = vec![
        visit("u1", "2023-01-01"),
        visit("u2", "Jan 1st"),
        ActivityRecord::new("u3", "2023-01-01", 1, -10.0),
    ];
    let response = calculate_retention(&records, &RetentionQuery::default());

    assert_eq!(response.skipped_records, 2);
    assert_eq!(response.cohorts.len(), 1);
    assert_eq!(response.cohorts[0].size, 1);
}

#[test]
fn empty_input_yields_no_cohorts_and_no_error() {
    let response = calculate_retention(&[], &RetentionQuery::default());
    assert!(response.cohorts.is_empty());
    assert_eq!(response.skipped_records, 0);
}

#[test]
fn retention_is_idempotent() {
    let records = vec![
        visit("u1", "2023-01-01"),
        visit("u2", "2023-01-01"),
        visit("u2", "2023-01-08"),
        visit("u3", "2023-01-02"),
    ];
    let query = RetentionQuery::default();
    assert_eq!(
        calculate_retention(&records, &query),
        calculate_retention(&records, &query)
    );
}
