use chrono_tz::Tz;

use cohortly_core::retention::DEFAULT_OFFSETS;
use cohortly_core::Granularity;

use crate::output::OutputFormat;

/// Defaults for every command, read from `COHORTLY_*` environment variables.
/// Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub timezone: Tz,
    pub granularity: Granularity,
    pub retention_offsets: Vec<u32>,
    pub default_fill: f64,
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            granularity: Granularity::Day,
            retention_offsets: DEFAULT_OFFSETS.to_vec(),
            default_fill: 0.0,
            output: OutputFormat::Json,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            timezone: match lookup("COHORTLY_TIMEZONE") {
                Some(raw) => parse_timezone(&raw)?,
                None => defaults.timezone,
            },
            granularity: match lookup("COHORTLY_GRANULARITY") {
                Some(raw) => raw
                    .parse::<Granularity>()
                    .map_err(|e| format!("COHORTLY_GRANULARITY: {e}"))?,
                None => defaults.granularity,
            },
            retention_offsets: match lookup("COHORTLY_RETENTION_OFFSETS") {
                Some(raw) => parse_offsets(&raw)
                    .map_err(|e| format!("COHORTLY_RETENTION_OFFSETS: {e}"))?,
                None => defaults.retention_offsets,
            },
            default_fill: match lookup("COHORTLY_DEFAULT_FILL") {
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid COHORTLY_DEFAULT_FILL: {e}"))?,
                None => defaults.default_fill,
            },
            output: match lookup("COHORTLY_OUTPUT") {
                Some(raw) => match raw.trim() {
                    "json" => OutputFormat::Json,
                    "csv" => OutputFormat::Csv,
                    other => {
                        return Err(format!(
                            "COHORTLY_OUTPUT must be json or csv (got {other:?})"
                        ))
                    }
                },
                None => defaults.output,
            },
        })
    }
}

pub fn parse_timezone(raw: &str) -> Result<Tz, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("timezone cannot be empty when provided".to_string());
    }
    trimmed
        .parse::<Tz>()
        .map_err(|_| format!("invalid timezone: {trimmed}"))
}

/// Comma-separated day offsets, e.g. `0,1,7,30`.
pub fn parse_offsets(raw: &str) -> Result<Vec<u32>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| format!("invalid offset {part:?} (expected a non-negative integer)"))
        })
        .collect()
}
