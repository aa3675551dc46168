use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::daterange::parse_date;
use crate::error::Result;

/// One user's activity on one calendar date, as delivered by the data source.
///
/// `date` stays a raw string: a row with an unparseable date is skipped by the
/// calculators that need the date instead of failing the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: String,
    pub date: String,
    #[serde(default)]
    pub sessions: u32,
    /// Total time spent across `sessions`, in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Unstructured passthrough from the data source. Never read by the
    /// calculators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ActivityRecord {
    pub fn new(
        user_id: impl Into<String>,
        date: impl Into<String>,
        sessions: u32,
        duration: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            date: date.into(),
            sessions,
            duration,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn parsed_date(&self) -> Result<NaiveDate> {
        parse_date(&self.date)
    }

    /// `duration` must be a finite, non-negative number of seconds.
    pub fn has_valid_measures(&self) -> bool {
        self.duration.is_finite() && self.duration >= 0.0
    }
}

/// Pair every well-formed record with its parsed date. Returns the pairs and
/// the number of records dropped.
pub(crate) fn dated_records(
    records: &[ActivityRecord],
) -> (Vec<(&ActivityRecord, NaiveDate)>, usize) {
    let mut dated = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for record in records {
        if !record.has_valid_measures() {
            tracing::debug!(
                user_id = %record.user_id,
                duration = record.duration,
                "Skipping record with invalid duration"
            );
            skipped += 1;
            continue;
        }
        match record.parsed_date() {
            Ok(date) => dated.push((record, date)),
            Err(error) => {
                tracing::debug!(
                    user_id = %record.user_id,
                    %error,
                    "Skipping record with unparseable date"
                );
                skipped += 1;
            }
        }
    }
    (dated, skipped)
}
