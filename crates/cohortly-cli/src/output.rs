use std::borrow::Cow;
use std::io::Write;

use serde::Serialize;

use cohortly_core::{
    DateRange, EngagementMetrics, EngagementReport, FunnelResults, PeriodGroups,
    RetentionResponse, TimeSeries,
};

use crate::commands::SeriesMetric;
use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesReport {
    pub metric: SeriesMetric,
    #[serde(flatten)]
    pub series: TimeSeries,
    /// Records dropped while grouping, before the series was built.
    pub skipped_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub name: String,
    #[serde(flatten)]
    pub range: DateRange,
    pub label: String,
    pub buckets: Vec<String>,
}

/// Everything a subcommand can print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Engagement(EngagementReport),
    PeriodEngagement(PeriodGroups<EngagementMetrics>),
    Retention(RetentionResponse),
    Series(SeriesReport),
    Funnel(FunnelResults),
    Range(RangeReport),
}

pub fn render<W: Write>(
    report: &Report,
    format: OutputFormat,
    mut out: W,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            write_csv(report, &mut wtr)?;
            wtr.flush()?;
        }
    }
    Ok(())
}

/// CSV is flat, so nested reports are written one row per leaf: a retention
/// row per (cohort, offset), a series row per point, a funnel row per step.
fn write_csv<W: Write>(report: &Report, wtr: &mut csv::Writer<W>) -> Result<(), CliError> {
    match report {
        Report::Engagement(report) => {
            wtr.write_record(METRIC_HEADERS.iter().chain(["skipped_records"].iter()))?;
            let mut row = metric_fields(&report.metrics);
            row.push(report.skipped_records.to_string());
            wtr.write_record(&row)?;
        }
        Report::PeriodEngagement(groups) => {
            wtr.write_record(["period"].iter().chain(METRIC_HEADERS.iter()))?;
            for (period, metrics) in &groups.buckets {
                let mut row = vec![period.clone()];
                row.extend(metric_fields(metrics));
                wtr.write_record(&row)?;
            }
        }
        Report::Retention(response) => {
            wtr.write_record(["cohort_key", "size", "offset", "percentage", "count"])?;
            for cohort in &response.cohorts {
                for period in &cohort.periods {
                    wtr.write_record([
                        cohort.cohort_key.clone(),
                        cohort.size.to_string(),
                        period.offset.to_string(),
                        period.percentage.to_string(),
                        period.count.to_string(),
                    ])?;
                }
            }
        }
        Report::Series(report) => {
            wtr.write_record(["date", "value"])?;
            for point in &report.series.points {
                wtr.write_record([point.date.clone(), point.value.to_string()])?;
            }
        }
        Report::Funnel(results) => {
            wtr.write_record([
                "step",
                "started",
                "completed",
                "drop_off_rate",
                "avg_time",
                "conversion_rate_from_start",
            ])?;
            for step in &results.steps {
                wtr.write_record([
                    sanitize_csv_field(&step.step).into_owned(),
                    step.started.to_string(),
                    step.completed.to_string(),
                    step.drop_off_rate.to_string(),
                    step.avg_time.to_string(),
                    step.conversion_rate_from_start.to_string(),
                ])?;
            }
        }
        Report::Range(report) => {
            wtr.write_record(["name", "start_date", "end_date", "key", "label"])?;
            wtr.write_record([
                sanitize_csv_field(&report.name).into_owned(),
                report.range.start_date().to_string(),
                report.range.end_date().to_string(),
                report.range.key().as_str().to_string(),
                report.label.clone(),
            ])?;
        }
    }
    Ok(())
}

const METRIC_HEADERS: [&str; 5] = [
    "total_users",
    "total_sessions",
    "total_duration",
    "avg_session_duration",
    "avg_sessions_per_user",
];

fn metric_fields(metrics: &EngagementMetrics) -> Vec<String> {
    vec![
        metrics.total_users.to_string(),
        metrics.total_sessions.to_string(),
        metrics.total_duration.to_string(),
        metrics.avg_session_duration.to_string(),
        metrics.avg_sessions_per_user.to_string(),
    ]
}

/// Prefix values a spreadsheet would evaluate as a formula with `'`.
fn sanitize_csv_field(val: &str) -> Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        Cow::Owned(format!("'{val}"))
    } else {
        Cow::Borrowed(val)
    }
}
