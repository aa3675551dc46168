//! Gap-filled time series.
//!
//! Sparse samples are laid onto the full bucket sequence of a range; buckets
//! without a sample get the caller's default value.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::daterange::{bucket_key, parse_date, DateRange, Granularity};
use crate::error::Result;
use crate::math::safe_divide;

/// An observed value, keyed by a `YYYY-MM-DD` date (or `YYYY-MM` for
/// monthly data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    pub date: String,
    pub value: f64,
}

impl TimeSeriesSample {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Bucket key.
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub points: Vec<TimeSeriesPoint>,
    pub granularity: Granularity,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Samples whose date could not be parsed.
    pub skipped_samples: usize,
    /// Samples dated outside the requested range.
    pub out_of_range_samples: usize,
}

impl TimeSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One point per bucket between `start` and `end` (inclusive, `YYYY-MM-DD`).
///
/// A bucket's value is the sum of its samples. Two samples on the same date
/// overwrite each other in input order. Samples outside the range are ignored
/// and counted.
pub fn generate_time_series(
    samples: &[TimeSeriesSample],
    start: &str,
    end: &str,
    granularity: Granularity,
    default_value: f64,
) -> Result<TimeSeries> {
    let range = DateRange::parse(start, end)?;
    Ok(series_for_range(samples, &range, granularity, default_value))
}

/// [`generate_time_series`] over an already validated range.
pub fn series_for_range(
    samples: &[TimeSeriesSample],
    range: &DateRange,
    granularity: Granularity,
    default_value: f64,
) -> TimeSeries {
    let anchor = Some(range.start_date());
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut skipped_samples = 0usize;
    let mut out_of_range_samples = 0usize;

    for sample in samples {
        let date = match parse_sample_date(&sample.date) {
            Ok(date) => date,
            Err(error) => {
                tracing::debug!(%error, "Skipping time series sample");
                skipped_samples += 1;
                continue;
            }
        };
        if !sample_in_range(&date, range, granularity) {
            out_of_range_samples += 1;
            continue;
        }
        by_date.insert(date.day(), sample.value);
    }

    let mut values: HashMap<String, f64> = HashMap::with_capacity(by_date.len());
    for (date, value) in by_date {
        *values
            .entry(bucket_key(date, granularity, anchor))
            .or_insert(0.0) += value;
    }

    let points: Vec<TimeSeriesPoint> = range
        .buckets(granularity)
        .into_iter()
        .map(|key| {
            let value = values.get(&key).copied().unwrap_or(default_value);
            TimeSeriesPoint { date: key, value }
        })
        .collect();

    let (total, min, max) = calculate_stats(&points);
    TimeSeries {
        avg: safe_divide(total, points.len() as f64),
        points,
        granularity,
        total,
        min,
        max,
        skipped_samples,
        out_of_range_samples,
    }
}

/// Date of a sample. A `YYYY-MM` key stands for the whole month.
enum SampleDate {
    Day(NaiveDate),
    Month(NaiveDate),
}

impl SampleDate {
    fn day(&self) -> NaiveDate {
        match self {
            SampleDate::Day(date) | SampleDate::Month(date) => *date,
        }
    }
}

/// Day samples must fall inside the range. A month sample charted by month
/// only has to overlap it, since the range may start or end mid-month.
fn sample_in_range(date: &SampleDate, range: &DateRange, granularity: Granularity) -> bool {
    match (date, granularity) {
        (SampleDate::Month(first), Granularity::Month) => {
            let month = (first.year(), first.month());
            let start = (range.start_date().year(), range.start_date().month());
            let end = (range.end_date().year(), range.end_date().month());
            start <= month && month <= end
        }
        _ => range.contains(date.day()),
    }
}

/// Accepts `YYYY-MM-DD`, or `YYYY-MM` as the first of that month.
fn parse_sample_date(raw: &str) -> Result<SampleDate> {
    parse_date(raw).map(SampleDate::Day).or_else(|error| {
        let trimmed = raw.trim();
        if trimmed.len() == 7 {
            parse_date(&format!("{trimmed}-01"))
                .map(SampleDate::Month)
                .map_err(|_| error)
        } else {
            Err(error)
        }
    })
}

fn calculate_stats(points: &[TimeSeriesPoint]) -> (f64, f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mut total = 0.0;
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for point in points {
        total += point.value;
        min = min.min(point.value);
        max = max.max(point.value);
    }
    (total, min, max)
}
