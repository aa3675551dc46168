use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use cohortly_core::timeseries::series_for_range;
use cohortly_core::{
    aggregate_engagement_report, calculate_funnel, calculate_retention, engagement_by_period,
    group_totals, resolve_named_range, ActivityRecord, AnalyticsError, Clock, DateRange,
    Granularity, GroupingConfig, PeriodTotals, RetentionQuery,
};

use crate::config::{parse_offsets, parse_timezone, Config};
use crate::error::CliError;
use crate::input::{load_funnel_steps, load_records, InputFormat, LoadedRecords};
use crate::output::{render, OutputFormat, RangeReport, Report, SeriesReport};

#[derive(Debug, Parser)]
#[command(name = "cohortly")]
#[command(about = "Cohort retention, engagement, funnel and time-series reports")]
#[command(version)]
pub struct Cli {
    /// Activity records file, JSON array or CSV (`-` reads stdin)
    #[arg(short, long, global = true, default_value = "-")]
    pub input: String,

    /// Records format (default: from the file extension, else json)
    #[arg(long, global = true, value_enum)]
    pub input_format: Option<InputFormat>,

    /// Report format [env: COHORTLY_OUTPUT]
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// IANA timezone used to resolve named ranges [env: COHORTLY_TIMEZONE]
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Distinct users, sessions and session duration
    Engagement {
        /// Report per period instead of dataset totals
        #[arg(long, value_parser = parse_granularity)]
        granularity: Option<Granularity>,
    },

    /// Cohort retention by first-seen date
    Retention {
        /// Cohort bucket: day, week, month
        #[arg(long, value_parser = parse_granularity)]
        granularity: Option<Granularity>,

        /// Comma-separated day offsets, e.g. 0,1,7,30
        #[arg(long)]
        offsets: Option<String>,

        /// First first-seen date (YYYY-MM-DD) that forms a cohort
        #[arg(long, requires = "cohort_end")]
        cohort_start: Option<String>,

        /// Last first-seen date (YYYY-MM-DD) that forms a cohort
        #[arg(long, requires = "cohort_start")]
        cohort_end: Option<String>,
    },

    /// Per-period series of a record metric with gaps filled
    Series {
        /// Range start, YYYY-MM-DD
        #[arg(long)]
        start: String,

        /// Range end, YYYY-MM-DD (inclusive)
        #[arg(long)]
        end: String,

        #[arg(long, value_parser = parse_granularity)]
        granularity: Option<Granularity>,

        /// Value for periods without activity [env: COHORTLY_DEFAULT_FILL]
        #[arg(long = "default", allow_negative_numbers = true)]
        default_value: Option<f64>,

        #[arg(long, value_enum, default_value_t = SeriesMetric::Sessions)]
        metric: SeriesMetric,
    },

    /// Drop-off and conversion over ordered funnel steps
    Funnel {
        /// JSON array of {step, started, completed, avg_time}
        #[arg(long)]
        steps: String,
    },

    /// Resolve a named range such as lastWeek or this_month
    Range {
        name: String,

        /// Granularity of the listed buckets
        #[arg(long, value_parser = parse_granularity)]
        granularity: Option<Granularity>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Engagement { .. } => "engagement",
            Command::Retention { .. } => "retention",
            Command::Series { .. } => "series",
            Command::Funnel { .. } => "funnel",
            Command::Range { .. } => "range",
        }
    }

    fn reads_records(&self) -> bool {
        matches!(
            self,
            Command::Engagement { .. } | Command::Retention { .. } | Command::Series { .. }
        )
    }
}

/// Record field plotted by `series`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMetric {
    Sessions,
    Duration,
    /// Distinct active users per period.
    Users,
}

impl SeriesMetric {
    fn value(self, totals: &PeriodTotals) -> f64 {
        match self {
            SeriesMetric::Sessions => totals.sessions as f64,
            SeriesMetric::Duration => totals.duration,
            SeriesMetric::Users => totals.active_users as f64,
        }
    }
}

fn parse_granularity(raw: &str) -> Result<Granularity, String> {
    raw.parse::<Granularity>().map_err(|e: AnalyticsError| e.to_string())
}

impl Cli {
    /// Overlay command-line flags onto the environment config.
    pub fn apply(&self, mut config: Config) -> Result<Config, CliError> {
        if let Some(raw) = &self.timezone {
            config.timezone = parse_timezone(raw).map_err(CliError::BadArgument)?;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        Ok(config)
    }

    pub fn input_format(&self) -> InputFormat {
        self.input_format.unwrap_or_else(|| InputFormat::detect(&self.input))
    }
}

/// Run one subcommand against already loaded records.
pub fn build_report(
    command: &Command,
    records: &[ActivityRecord],
    config: &Config,
    clock: &dyn Clock,
) -> Result<Report, CliError> {
    let report = match command {
        Command::Engagement { granularity: None } => {
            Report::Engagement(aggregate_engagement_report(records))
        }
        Command::Engagement {
            granularity: Some(granularity),
        } => Report::PeriodEngagement(engagement_by_period(
            records,
            &GroupingConfig::new(*granularity),
        )),
        Command::Retention {
            granularity,
            offsets,
            cohort_start,
            cohort_end,
        } => {
            let offsets = match offsets {
                Some(raw) => parse_offsets(raw).map_err(CliError::BadArgument)?,
                None => config.retention_offsets.clone(),
            };
            if offsets.is_empty() {
                return Err(CliError::BadArgument(
                    "at least one retention offset is required".to_string(),
                ));
            }
            let mut query = RetentionQuery::default()
                .with_granularity(granularity.unwrap_or(config.granularity))
                .with_offsets(offsets);
            if let (Some(start), Some(end)) = (cohort_start, cohort_end) {
                query = query.with_cohort_range(DateRange::parse(start, end)?);
            }
            Report::Retention(calculate_retention(records, &query))
        }
        Command::Series {
            start,
            end,
            granularity,
            default_value,
            metric,
        } => {
            let range = DateRange::parse(start, end)?;
            let granularity = granularity.unwrap_or(config.granularity);
            // Records with a bad date stay in so grouping counts them as skipped.
            let in_range: Vec<ActivityRecord> = records
                .iter()
                .filter(|record| record.parsed_date().map_or(true, |date| range.contains(date)))
                .cloned()
                .collect();
            let grouping = GroupingConfig::new(granularity).anchored_at(range.start_date());
            let groups = group_totals(&in_range, &grouping);
            let samples = groups.to_samples(|totals| metric.value(totals));
            let series = series_for_range(
                &samples,
                &range,
                granularity,
                default_value.unwrap_or(config.default_fill),
            );
            Report::Series(SeriesReport {
                metric: *metric,
                series,
                skipped_records: groups.skipped_records,
            })
        }
        Command::Funnel { steps } => Report::Funnel(calculate_funnel(&load_funnel_steps(steps)?)),
        Command::Range { name, granularity } => {
            let range = resolve_named_range(name, clock, config.timezone)?;
            Report::Range(RangeReport {
                name: name.clone(),
                label: range.label(),
                buckets: range.buckets(granularity.unwrap_or(config.granularity)),
                range,
            })
        }
    };
    Ok(report)
}

fn skipped_records(report: &Report) -> usize {
    match report {
        Report::Engagement(report) => report.skipped_records,
        Report::PeriodEngagement(groups) => groups.skipped_records,
        Report::Retention(response) => response.skipped_records,
        Report::Series(report) => report.skipped_records + report.series.skipped_samples,
        Report::Funnel(_) | Report::Range(_) => 0,
    }
}

/// Load input, build the report and write it to `out`.
pub fn run<W: Write>(
    cli: &Cli,
    config: Config,
    clock: &dyn Clock,
    out: W,
) -> Result<(), CliError> {
    let config = cli.apply(config)?;

    let loaded = if cli.command.reads_records() {
        load_records(&cli.input, cli.input_format())?
    } else {
        LoadedRecords::default()
    };
    if loaded.rejected_rows > 0 {
        warn!(
            input = %cli.input,
            rejected_rows = loaded.rejected_rows,
            "Input rows could not be parsed and were ignored"
        );
    }

    info!(
        command = cli.command.name(),
        records = loaded.records.len(),
        "Building report"
    );
    let report = build_report(&cli.command, &loaded.records, &config, clock)?;

    let skipped = skipped_records(&report);
    if skipped > 0 {
        warn!(
            command = cli.command.name(),
            skipped_records = skipped,
            "Malformed records were skipped"
        );
    }

    render(&report, config.output, out)
}
