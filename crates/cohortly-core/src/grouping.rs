//! Bucket activity records into periods.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::daterange::{bucket_key, Granularity};
use crate::record::{dated_records, ActivityRecord};
use crate::timeseries::TimeSeriesSample;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    pub granularity: Granularity,
    /// First day of the first week bucket. `None` aligns weeks to Monday.
    pub anchor: Option<NaiveDate>,
}

impl GroupingConfig {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            anchor: None,
        }
    }

    pub fn anchored_at(mut self, anchor: NaiveDate) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

/// Per-bucket aggregates keyed by bucket key, ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodGroups<T> {
    pub granularity: Granularity,
    pub buckets: BTreeMap<String, T>,
    /// Records dropped for an unparseable date or invalid duration.
    pub skipped_records: usize,
}

impl<T> PeriodGroups<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.buckets.get(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PeriodGroups<U> {
        PeriodGroups {
            granularity: self.granularity,
            buckets: self
                .buckets
                .into_iter()
                .map(|(key, value)| (key, f(value)))
                .collect(),
            skipped_records: self.skipped_records,
        }
    }

    /// One sample per non-empty bucket, ready for
    /// [`generate_time_series`](crate::timeseries::generate_time_series).
    pub fn to_samples(&self, value: impl Fn(&T) -> f64) -> Vec<TimeSeriesSample> {
        self.buckets
            .iter()
            .map(|(key, bucket)| TimeSeriesSample::new(key.clone(), value(bucket)))
            .collect()
    }
}

/// Fold every well-formed record into the bucket its date falls into.
///
/// Malformed records are counted in `skipped_records` and otherwise ignored.
pub fn group_by_period<T, F>(
    records: &[ActivityRecord],
    config: &GroupingConfig,
    mut reduce: F,
) -> PeriodGroups<T>
where
    T: Default,
    F: FnMut(&mut T, &ActivityRecord),
{
    let (dated, skipped_records) = dated_records(records);
    let mut buckets: BTreeMap<String, T> = BTreeMap::new();

    for (record, date) in dated {
        let key = bucket_key(date, config.granularity, config.anchor);
        reduce(buckets.entry(key).or_default(), record);
    }

    if skipped_records > 0 {
        tracing::debug!(
            skipped_records,
            granularity = %config.granularity,
            "Dropped malformed records while grouping"
        );
    }

    PeriodGroups {
        granularity: config.granularity,
        buckets,
        skipped_records,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub records: u64,
    pub active_users: u64,
    pub sessions: u64,
    pub duration: f64,
}

#[derive(Default)]
struct TotalsAccumulator {
    totals: PeriodTotals,
    users: HashSet<String>,
}

impl TotalsAccumulator {
    fn add(&mut self, record: &ActivityRecord) {
        self.totals.records += 1;
        self.totals.sessions += u64::from(record.sessions);
        self.totals.duration += record.duration;
        self.users.insert(record.user_id.clone());
    }

    fn finish(self) -> PeriodTotals {
        PeriodTotals {
            active_users: self.users.len() as u64,
            ..self.totals
        }
    }
}

/// Record count, distinct users, sessions and duration per bucket.
pub fn group_totals(
    records: &[ActivityRecord],
    config: &GroupingConfig,
) -> PeriodGroups<PeriodTotals> {
    group_by_period(records, config, TotalsAccumulator::add).map(TotalsAccumulator::finish)
}
