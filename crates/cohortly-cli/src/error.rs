use cohortly_core::AnalyticsError;
use thiserror::Error;

/// Fatal errors for a single CLI invocation. Row-level problems in the input
/// are counted and reported, not raised.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
