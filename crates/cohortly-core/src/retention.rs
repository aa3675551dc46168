//! Cohort retention.
//!
//! Users are assigned to the cohort of the bucket containing their first
//! observed date. A user counts as retained at offset `k` only when they have
//! activity dated exactly `first_seen + k` days; activity on any other day in
//! between does not count.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::daterange::{bucket_key, bucket_start, DateRange, Granularity};
use crate::math::{percentage, round_to, safe_divide};
use crate::record::{dated_records, ActivityRecord};

pub const DEFAULT_OFFSETS: [u32; 5] = [0, 1, 7, 14, 30];

#[derive(Debug, Clone)]
pub struct RetentionQuery {
    /// Bucket used to group users into cohorts by first-seen date.
    pub granularity: Granularity,
    /// Day offsets from each user's first-seen date to report.
    pub offsets: Vec<u32>,
    /// Only users first seen inside this range form cohorts.
    pub cohort_range: Option<DateRange>,
}

impl Default for RetentionQuery {
    fn default() -> Self {
        Self {
            granularity: Granularity::Day,
            offsets: DEFAULT_OFFSETS.to_vec(),
            cohort_range: None,
        }
    }
}

impl RetentionQuery {
    pub fn with_offsets(mut self, offsets: impl Into<Vec<u32>>) -> Self {
        self.offsets = offsets.into();
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_cohort_range(mut self, range: DateRange) -> Self {
        self.cohort_range = Some(range);
        self
    }

    /// Requested offsets, ascending and without duplicates.
    fn normalized_offsets(&self) -> Vec<u32> {
        let mut offsets = self.offsets.clone();
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPeriod {
    pub offset: u32,
    /// Share of the cohort active on this offset, 0–100, one decimal.
    pub percentage: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub cohort_key: String,
    pub size: u64,
    pub periods: Vec<RetentionPeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetAverage {
    pub offset: u32,
    pub average_percentage: f64,
    /// Cohorts old enough to have reached this offset.
    pub cohorts: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionSummary {
    pub average_rates: Vec<OffsetAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionResponse {
    pub granularity: Granularity,
    pub offsets: Vec<u32>,
    pub cohorts: Vec<Cohort>,
    pub summary: RetentionSummary,
    pub skipped_records: usize,
}

#[derive(Default)]
struct UserActivity {
    first_seen: Option<NaiveDate>,
    active_days: HashSet<NaiveDate>,
}

struct CohortMembers<'a> {
    start: NaiveDate,
    users: Vec<(&'a str, NaiveDate)>,
}

pub fn calculate_retention(
    records: &[ActivityRecord],
    query: &RetentionQuery,
) -> RetentionResponse {
    let offsets = query.normalized_offsets();
    let (dated, skipped_records) = dated_records(records);

    let mut users: HashMap<&str, UserActivity> = HashMap::new();
    let mut last_observed: Option<NaiveDate> = None;
    for (record, date) in dated {
        let activity = users.entry(record.user_id.as_str()).or_default();
        activity.first_seen = Some(activity.first_seen.map_or(date, |seen| seen.min(date)));
        activity.active_days.insert(date);
        last_observed = Some(last_observed.map_or(date, |last| last.max(date)));
    }

    let anchor = query.cohort_range.map(|range| range.start_date());
    let mut grouped: BTreeMap<String, CohortMembers<'_>> = BTreeMap::new();
    for (&user_id, activity) in &users {
        let Some(first_seen) = activity.first_seen else {
            continue;
        };
        if let Some(range) = query.cohort_range {
            if !range.contains(first_seen) {
                continue;
            }
        }
        let key = bucket_key(first_seen, query.granularity, anchor);
        grouped
            .entry(key)
            .or_insert_with(|| CohortMembers {
                start: bucket_start(first_seen, query.granularity, anchor),
                users: Vec::new(),
            })
            .users
            .push((user_id, first_seen));
    }

    let cohort_starts: Vec<NaiveDate> = grouped.values().map(|members| members.start).collect();
    let cohorts: Vec<Cohort> = grouped
        .into_iter()
        .map(|(cohort_key, members)| build_cohort(cohort_key, &members, &users, &offsets))
        .collect();
    let summary = compute_summary(&cohorts, &cohort_starts, &offsets, last_observed);

    tracing::debug!(
        cohorts = cohorts.len(),
        users = users.len(),
        skipped_records,
        granularity = %query.granularity,
        "Computed cohort retention"
    );

    RetentionResponse {
        granularity: query.granularity,
        offsets,
        cohorts,
        summary,
        skipped_records,
    }
}

fn build_cohort(
    cohort_key: String,
    members: &CohortMembers<'_>,
    users: &HashMap<&str, UserActivity>,
    offsets: &[u32],
) -> Cohort {
    let size = members.users.len() as u64;
    let periods = offsets
        .iter()
        .map(|&offset| {
            let count = members
                .users
                .iter()
                .filter(|(user_id, first_seen)| {
                    let Some(target) =
                        first_seen.checked_add_signed(Duration::days(i64::from(offset)))
                    else {
                        return false;
                    };
                    users
                        .get(user_id)
                        .is_some_and(|activity| activity.active_days.contains(&target))
                })
                .count() as u64;
            RetentionPeriod {
                offset,
                percentage: percentage(count, size),
                count,
            }
        })
        .collect();

    Cohort {
        cohort_key,
        size,
        periods,
    }
}

/// Mean percentage per offset over the cohorts that have had time to reach
/// it, judged from the cohort's first day against the last observed activity.
fn compute_summary(
    cohorts: &[Cohort],
    cohort_starts: &[NaiveDate],
    offsets: &[u32],
    last_observed: Option<NaiveDate>,
) -> RetentionSummary {
    let average_rates = offsets
        .iter()
        .enumerate()
        .map(|(index, &offset)| {
            let mut sum = 0.0;
            let mut matured = 0u64;
            if let Some(last) = last_observed {
                for (cohort, start) in cohorts.iter().zip(cohort_starts) {
                    let elapsed = (last - *start).num_days();
                    if elapsed < i64::from(offset) {
                        continue;
                    }
                    sum += cohort
                        .periods
                        .get(index)
                        .map(|period| period.percentage)
                        .unwrap_or(0.0);
                    matured += 1;
                }
            }
            OffsetAverage {
                offset,
                average_percentage: round_to(safe_divide(sum, matured as f64), 1),
                cohorts: matured,
            }
        })
        .collect();

    RetentionSummary { average_rates }
}
