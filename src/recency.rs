// ⏳ Recency Deriver - "how many days ago was this measured?"
// Whole-day difference between a reference date and the measurement date.

use crate::error::DateParseError;
use chrono::NaiveDate;

/// `reference - measured` in whole days. Negative when measured is in the future.
pub fn days_ago(measured: NaiveDate, reference: NaiveDate) -> i64 {
    (reference - measured).num_days()
}

/// Parse a `date_measured` cell. `line` is only carried into the error.
pub fn parse_measured_date(value: &str, layout: &str, line: usize) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(value.trim(), layout).map_err(|_| DateParseError {
        line,
        value: value.to_string(),
        layout: layout.to_string(),
    })
}
