use cohortly_core::{
    generate_time_series, group_totals, ActivityRecord, Granularity, GroupingConfig,
    TimeSeriesSample,
};

#[test]
fn missing_middle_day_is_zero_filled() {
    let samples = vec![
        TimeSeriesSample::new("2023-01-01", 10.0),
        TimeSeriesSample::new("2023-01-03", 20.0),
    ];
    let series = generate_time_series(&samples, "2023-01-01", "2023-01-03", Granularity::Day, 0.0)
        .expect("series");

    let dates: Vec<&str> = series.points.iter().map(|p| p.date.as_str()).collect();
    assert_eq!(dates, vec!["2023-01-01", "2023-01-02", "2023-01-03"]);
    assert_eq!(series.values(), vec![10.0, 0.0, 20.0]);
}

#[test]
fn generator_is_idempotent() {
    let samples = vec![
        TimeSeriesSample::new("2023-01-05", 1.5),
        TimeSeriesSample::new("2023-01-02", 2.5),
    ];
    let first = generate_time_series(&samples, "2023-01-01", "2023-01-07", Granularity::Day, 0.0)
        .expect("series");
    let second = generate_time_series(&samples, "2023-01-01", "2023-01-07", Granularity::Day, 0.0)
        .expect("series");
    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
}

#[test]
fn grouped_records_chart_into_a_filled_series() {
    let records = vec![
        ActivityRecord::new("u1", "2023-01-01", 2, 10.0),
        ActivityRecord::new("u2", "2023-01-01", 1, 10.0),
        ActivityRecord::new("u1", "2023-01-04", 4, 10.0),
    ];
    let groups = group_totals(&records, &GroupingConfig::new(Granularity::Day));
    let samples = groups.to_samples(|totals| totals.sessions as f64);
    let series = generate_time_series(&samples, "2023-01-01", "2023-01-05", Granularity::Day, 0.0)
        .expect("series");

    assert_eq!(series.values(), vec![3.0, 0.0, 0.0, 4.0, 0.0]);
    assert_eq!(series.total, 7.0);
}
