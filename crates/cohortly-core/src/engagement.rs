use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::grouping::{group_by_period, GroupingConfig, PeriodGroups};
use crate::math::safe_divide;
use crate::record::ActivityRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub total_users: u64,
    pub total_sessions: u64,
    pub total_duration: f64,
    /// Seconds per session; 0 when there were no sessions.
    pub avg_session_duration: f64,
    pub avg_sessions_per_user: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementReport {
    pub metrics: EngagementMetrics,
    pub skipped_records: usize,
}

#[derive(Default)]
struct EngagementAccumulator {
    users: HashSet<String>,
    sessions: u64,
    duration: f64,
}

impl EngagementAccumulator {
    fn add(&mut self, record: &ActivityRecord) {
        if !self.users.contains(&record.user_id) {
            self.users.insert(record.user_id.clone());
        }
        self.sessions += u64::from(record.sessions);
        self.duration += record.duration;
    }

    fn finish(self) -> EngagementMetrics {
        let total_users = self.users.len() as u64;
        EngagementMetrics {
            total_users,
            total_sessions: self.sessions,
            total_duration: self.duration,
            avg_session_duration: safe_divide(self.duration, self.sessions as f64),
            avg_sessions_per_user: safe_divide(self.sessions as f64, total_users as f64),
        }
    }
}

/// Dataset-wide engagement totals.
pub fn aggregate_engagement(records: &[ActivityRecord]) -> EngagementMetrics {
    aggregate_engagement_report(records).metrics
}

/// [`aggregate_engagement`] plus the number of records dropped for an invalid
/// duration. Dates are not inspected here.
pub fn aggregate_engagement_report(records: &[ActivityRecord]) -> EngagementReport {
    let mut acc = EngagementAccumulator::default();
    let mut skipped_records = 0usize;
    for record in records {
        if record.has_valid_measures() {
            acc.add(record);
        } else {
            skipped_records += 1;
        }
    }
    if skipped_records > 0 {
        tracing::debug!(skipped_records, "Dropped records with invalid duration");
    }
    EngagementReport {
        metrics: acc.finish(),
        skipped_records,
    }
}

/// Engagement metrics for each period bucket.
pub fn engagement_by_period(
    records: &[ActivityRecord],
    config: &GroupingConfig,
) -> PeriodGroups<EngagementMetrics> {
    group_by_period(records, config, EngagementAccumulator::add).map(EngagementAccumulator::finish)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daterange::Granularity;

    #[test]
    fn zero_sessions_yield_zero_average() {
        let records = vec![ActivityRecord::new("u1", "2023-01-01", 0, 120.0)];
        let metrics = aggregate_engagement(&records);
        assert_eq!(metrics.total_users, 1);
        assert_eq!(metrics.total_sessions, 0);
        assert_eq!(metrics.avg_session_duration, 0.0);
    }

    #[test]
    fn invalid_duration_is_skipped_but_bad_date_is_not() {
        let records = vec![
            ActivityRecord::new("u1", "garbage", 2, 60.0),
            ActivityRecord::new("u2", "2023-01-01", 1, -1.0),
        ];
        let report = aggregate_engagement_report(&records);
        assert_eq!(report.skipped_records, 1);
        assert_eq!(report.metrics.total_users, 1);
        assert_eq!(report.metrics.avg_session_duration, 30.0);
    }

    #[test]
    fn per_period_metrics() {
        let records = vec![
            ActivityRecord::new("u1", "2023-01-01", 2, 100.0),
            ActivityRecord::new("u2", "2023-01-01", 2, 300.0),
            ActivityRecord::new("u1", "2023-02-03", 1, 50.0),
        ];
        let groups = engagement_by_period(&records, &GroupingConfig::new(Granularity::Month));
        let january = groups.get("2023-01").expect("january");
        assert_eq!(january.total_users, 2);
        assert_eq!(january.avg_session_duration, 100.0);
        assert_eq!(january.avg_sessions_per_user, 2.0);
        let february = groups.get("2023-02").expect("february");
        assert_eq!(february.total_sessions, 1);
    }
}
