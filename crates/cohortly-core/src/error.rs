use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Input could not be parsed as a `YYYY-MM-DD` calendar date.
    #[error("invalid date: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid range: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown named range: {0}")]
    UnknownRange(String),

    #[error("granularity must be one of: day, week, month (got {0:?})")]
    InvalidGranularity(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
