//! Cohort and time-series analytics over per-user activity records.
//!
//! Everything here is a pure function of its arguments: records come in as an
//! in-memory slice, results go out as serializable value types, and "now" is
//! only ever read through an injected [`Clock`].
//!
//! ```ignore
//! use cohortly_core::{calculate_retention, generate_time_series, Granularity, RetentionQuery};
//!
//! let retention = calculate_retention(&records, &RetentionQuery::default());
//! let series = generate_time_series(&samples, "2023-01-01", "2023-01-31", Granularity::Day, 0.0)?;
//! ```
//!
//! Malformed records (bad date, negative duration) never abort a batch; each
//! result carries a `skipped_records` count instead. Bad range arguments fail
//! fast with [`AnalyticsError`].

pub mod clock;
pub mod daterange;
pub mod engagement;
pub mod error;
pub mod funnel;
pub mod grouping;
pub mod math;
pub mod record;
pub mod retention;
pub mod timeseries;

pub use clock::{Clock, FixedClock, SystemClock};
pub use daterange::{
    build_range_sequence, format_range, resolve_named_range, time_ago, DateRange, Granularity,
    RangeKey,
};
pub use engagement::{
    aggregate_engagement, aggregate_engagement_report, engagement_by_period, EngagementMetrics,
    EngagementReport,
};
pub use error::{AnalyticsError, Result};
pub use funnel::{calculate_funnel, FunnelResults, FunnelStep, FunnelStepInput};
pub use grouping::{group_by_period, group_totals, GroupingConfig, PeriodGroups, PeriodTotals};
pub use record::ActivityRecord;
pub use retention::{
    calculate_retention, Cohort, RetentionPeriod, RetentionQuery, RetentionResponse,
};
pub use timeseries::{generate_time_series, TimeSeries, TimeSeriesPoint, TimeSeriesSample};
