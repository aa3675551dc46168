//! Calendar date ranges and period bucket keys.
//!
//! Bucket keys are plain strings so they serialize as-is: `YYYY-MM-DD` for
//! day and week buckets (a week key is the first day of its 7-day bucket) and
//! `YYYY-MM` for month buckets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{AnalyticsError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MONTH_FORMAT: &str = "%Y-%m";
const LABEL_FORMAT: &str = "%b %-d, %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl FromStr for Granularity {
    type Err = AnalyticsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            _ => Err(AnalyticsError::InvalidGranularity(raw.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of period a [`DateRange`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKey {
    Day,
    Week,
    Month,
    Custom,
}

impl RangeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKey::Day => "day",
            RangeKey::Week => "week",
            RangeKey::Month => "month",
            RangeKey::Custom => "custom",
        }
    }
}

/// An inclusive span of calendar days. `start_date <= end_date` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
    key: RangeKey,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, key: RangeKey) -> Result<Self> {
        if end_date < start_date {
            return Err(AnalyticsError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            key,
        })
    }

    /// Build a custom range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?, RangeKey::Custom)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn key(&self) -> RangeKey {
        self.key
    }

    /// Number of calendar days covered, both endpoints included.
    pub fn days(&self) -> i64 {
        days_between(self.start_date, self.end_date) + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// e.g. `"Jan 1, 2023 - Jan 31, 2023"`.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start_date.format(LABEL_FORMAT),
            self.end_date.format(LABEL_FORMAT)
        )
    }

    pub fn buckets(&self, granularity: Granularity) -> Vec<String> {
        generate_buckets(self.start_date, self.end_date, granularity)
    }
}

/// Parse a `YYYY-MM-DD` calendar date. Surrounding whitespace is ignored.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AnalyticsError::InvalidDate(raw.to_string()))
}

/// Signed number of days from `start` to `end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Render two date strings as `"Jan 1, 2023 - Jan 31, 2023"`.
pub fn format_range(start: &str, end: &str) -> Result<String> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    Ok(format!(
        "{} - {}",
        start.format(LABEL_FORMAT),
        end.format(LABEL_FORMAT)
    ))
}

/// Every bucket key between two `YYYY-MM-DD` strings, inclusive, ascending.
pub fn build_range_sequence(
    start: &str,
    end: &str,
    granularity: Granularity,
) -> Result<Vec<String>> {
    bucket_sequence(parse_date(start)?, parse_date(end)?, granularity)
}

/// Typed form of [`build_range_sequence`].
///
/// Week buckets are 7-day windows starting at `start`, so the last bucket may
/// extend past `end`.
pub fn bucket_sequence(
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> Result<Vec<String>> {
    let range = DateRange::new(start, end, RangeKey::Custom)?;
    Ok(range.buckets(granularity))
}

fn generate_buckets(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<String> {
    let mut buckets = Vec::new();
    match granularity {
        Granularity::Day => {
            let mut current = Some(start);
            while let Some(day) = current.filter(|day| *day <= end) {
                buckets.push(day.format(DATE_FORMAT).to_string());
                current = day.succ_opt();
            }
        }
        Granularity::Week => {
            let weeks = (days_between(start, end) + 7) / 7;
            for week in 0..weeks {
                let Some(bucket_start) = start.checked_add_signed(Duration::days(week * 7))
                else {
                    break;
                };
                buckets.push(bucket_start.format(DATE_FORMAT).to_string());
            }
        }
        Granularity::Month => {
            let mut year = start.year();
            let mut month = start.month();
            let end_year = end.year();
            let end_month = end.month();
            loop {
                buckets.push(format!("{:04}-{:02}", year, month));
                if year > end_year || (year == end_year && month >= end_month) {
                    break;
                }
                month += 1;
                if month > 12 {
                    month = 1;
                    year += 1;
                }
            }
        }
    }
    buckets
}

/// First day of the bucket `date` falls into.
///
/// Week buckets are aligned to `anchor` when given (the start of the range
/// being charted), otherwise to the ISO week starting Monday. A bucket that
/// would begin before the earliest representable date starts there instead.
pub fn bucket_start(
    date: NaiveDate,
    granularity: Granularity,
    anchor: Option<NaiveDate>,
) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => match anchor {
            Some(anchor) => {
                let offset = days_between(anchor, date).div_euclid(7);
                anchor
                    .checked_add_signed(Duration::days(offset * 7))
                    .unwrap_or(NaiveDate::MIN)
            }
            None => {
                let from_monday = date.weekday().num_days_from_monday();
                date.checked_sub_signed(Duration::days(i64::from(from_monday)))
                    .unwrap_or(NaiveDate::MIN)
            }
        },
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Key of the bucket `date` falls into. See [`bucket_start`].
pub fn bucket_key(
    date: NaiveDate,
    granularity: Granularity,
    anchor: Option<NaiveDate>,
) -> String {
    let start = bucket_start(date, granularity, anchor);
    match granularity {
        Granularity::Day | Granularity::Week => start.format(DATE_FORMAT).to_string(),
        Granularity::Month => start.format(MONTH_FORMAT).to_string(),
    }
}

/// Resolve a named preset relative to the clock's current instant, seen from
/// timezone `tz`.
///
/// Names are case-insensitive and may be camelCase or snake_case:
/// `today`, `yesterday`, `last7Days`, `last30Days`, `thisWeek`, `lastWeek`,
/// `thisMonth`, `lastMonth`, `thisYear`.
pub fn resolve_named_range(name: &str, clock: &dyn Clock, tz: Tz) -> Result<DateRange> {
    let today = clock.now().with_timezone(&tz).date_naive();
    let normalized = name
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();

    let week_start = bucket_start(today, Granularity::Week, None);
    let month_start = bucket_start(today, Granularity::Month, None);

    let (start, end, key) = match normalized.as_str() {
        "today" => (today, today, RangeKey::Day),
        "yesterday" => {
            let yesterday = today - Duration::days(1);
            (yesterday, yesterday, RangeKey::Day)
        }
        "last7days" => (today - Duration::days(6), today, RangeKey::Week),
        "last30days" => (today - Duration::days(29), today, RangeKey::Month),
        "thisweek" => (week_start, today, RangeKey::Week),
        "lastweek" => (
            week_start - Duration::days(7),
            week_start - Duration::days(1),
            RangeKey::Week,
        ),
        "thismonth" => (month_start, today, RangeKey::Month),
        "lastmonth" => {
            let previous = month_start
                .checked_sub_months(Months::new(1))
                .ok_or_else(|| AnalyticsError::UnknownRange(name.to_string()))?;
            (previous, month_start - Duration::days(1), RangeKey::Month)
        }
        "thisyear" => {
            let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1)
                .ok_or_else(|| AnalyticsError::UnknownRange(name.to_string()))?;
            (year_start, today, RangeKey::Custom)
        }
        _ => return Err(AnalyticsError::UnknownRange(name.to_string())),
    };

    DateRange::new(start, end, key)
}

/// Render `instant` relative to the clock, e.g. `"3 days ago"` or `"in 2 hours"`.
pub fn time_ago(instant: DateTime<Utc>, clock: &dyn Clock) -> String {
    let delta = clock.now() - instant;
    let future = delta < Duration::zero();
    let seconds = delta.num_seconds().abs();

    if seconds < 45 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let (count, unit) = if minutes < 60 {
        (minutes.max(1), "minute")
    } else if hours < 24 {
        (hours, "hour")
    } else if days < 30 {
        (days, "day")
    } else if days < 365 {
        (days / 30, "month")
    } else {
        (days / 365, "year")
    };

    let plural = if count == 1 { "" } else { "s" };
    if future {
        format!("in {count} {unit}{plural}")
    } else {
        format!("{count} {unit}{plural} ago")
    }
}
