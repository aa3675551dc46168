use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use cohortly_core::{ActivityRecord, FunnelStepInput};

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    /// `.csv` files are CSV; everything else, stdin included, is JSON.
    pub fn detect(path: &str) -> Self {
        let is_csv = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::Csv
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRecords {
    pub records: Vec<ActivityRecord>,
    /// Rows that could not be deserialized at all (missing `user_id`, a
    /// non-numeric `sessions`, ...).
    pub rejected_rows: usize,
}

/// Parse a records stream. A bad row is dropped and counted; a stream that is
/// not a JSON array (or not CSV) fails the whole read.
pub fn read_records<R: Read>(reader: R, format: InputFormat) -> Result<LoadedRecords, CliError> {
    let mut loaded = LoadedRecords::default();
    match format {
        InputFormat::Json => {
            let rows: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
            for (index, row) in rows.into_iter().enumerate() {
                match serde_json::from_value::<ActivityRecord>(row) {
                    Ok(record) => loaded.records.push(record),
                    Err(error) => {
                        tracing::debug!(index, %error, "Rejected JSON record");
                        loaded.rejected_rows += 1;
                    }
                }
            }
        }
        InputFormat::Csv => {
            let mut rdr = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(reader);
            for (index, row) in rdr.deserialize::<ActivityRecord>().enumerate() {
                match row {
                    Ok(record) => loaded.records.push(record),
                    Err(error) => {
                        tracing::debug!(index, %error, "Rejected CSV row");
                        loaded.rejected_rows += 1;
                    }
                }
            }
        }
    }
    Ok(loaded)
}

/// Load records from `path`, or from stdin when `path` is `-`.
pub fn load_records(path: &str, format: InputFormat) -> Result<LoadedRecords, CliError> {
    if path == "-" {
        return read_records(std::io::stdin().lock(), format);
    }
    let file = open(path)?;
    read_records(BufReader::new(file), format)
}

pub fn read_funnel_steps<R: Read>(reader: R) -> Result<Vec<FunnelStepInput>, CliError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn load_funnel_steps(path: &str) -> Result<Vec<FunnelStepInput>, CliError> {
    if path == "-" {
        return read_funnel_steps(std::io::stdin().lock());
    }
    read_funnel_steps(BufReader::new(open(path)?))
}

fn open(path: &str) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(InputFormat::detect("events.csv"), InputFormat::Csv);
        assert_eq!(InputFormat::detect("EVENTS.CSV"), InputFormat::Csv);
        assert_eq!(InputFormat::detect("events.json"), InputFormat::Json);
        assert_eq!(InputFormat::detect("-"), InputFormat::Json);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_records("/definitely/not/here.json", InputFormat::Json)
            .expect_err("missing file");
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
