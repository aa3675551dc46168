//! Command-line front end for `cohortly-core`: reads activity records from a
//! JSON or CSV file, runs one report and prints it as JSON or CSV.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;

pub use commands::{build_report, run, Cli, Command, SeriesMetric};
pub use config::Config;
pub use error::CliError;
pub use input::{read_records, InputFormat, LoadedRecords};
pub use output::{render, OutputFormat, Report};
