// ⚠️ Error kinds for the cleaning pipeline
// Empty countries and unmatched strings are NOT errors - they are defined outcomes

use serde::Serialize;
use thiserror::Error;

/// A `date_measured` value that does not fit the expected layout
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("line {line}: cannot parse date {value:?} with layout {layout:?}")]
pub struct DateParseError {
    /// 1-based data row the value came from (0 when parsed outside a table)
    pub line: usize,
    pub value: String,
    pub layout: String,
}

#[derive(Error, Debug)]
pub enum CleanError {
    #[error(transparent)]
    DateParse(#[from] DateParseError),

    #[error("required column {0:?} not found in CSV header")]
    MissingColumn(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("audit store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, CleanError>;
