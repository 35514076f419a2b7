// 📋 Table - CSV records with a typed country / date view
//
// Only `country` and `date_measured` are interpreted; every other column is carried
// through untouched so a cleaned extract can be written back out.

use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::path::Path;

pub const COUNTRY_COLUMN: &str = "country";
pub const DATE_COLUMN: &str = "date_measured";
pub const DAYS_AGO_COLUMN: &str = "days_ago";

/// One CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// 1-based data row (header excluded) - provenance for reports and audit
    pub line_number: usize,

    /// `None` when the cell was empty in the source
    pub country: Option<String>,

    /// Raw cell; parsed by the recency stage
    pub date_measured: String,

    /// Set by the recency stage
    pub days_ago: Option<i64>,

    /// All original cells in header order
    pub values: Vec<String>,
}

impl Record {
    /// Row with only the interpreted fields (tests and ad-hoc use)
    pub fn new(line_number: usize, country: Option<&str>, date_measured: &str) -> Self {
        Record {
            line_number,
            country: country.map(str::to_string),
            date_measured: date_measured.to_string(),
            days_ago: None,
            values: Vec::new(),
        }
    }

    pub fn has_country(&self) -> bool {
        self.country.as_deref().map_or(false, |c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub country_col: usize,
    pub date_col: usize,

    /// Present when the input already carries a `days_ago` column (re-runs)
    pub days_col: Option<usize>,

    pub records: Vec<Record>,
}

impl Table {
    /// Table without a CSV origin; output gets `country,date_measured,days_ago`
    pub fn from_records(records: Vec<Record>) -> Self {
        Table {
            headers: vec![COUNTRY_COLUMN.to_string(), DATE_COLUMN.to_string()],
            country_col: 0,
            date_col: 1,
            days_col: None,
            records,
        }
    }

    /// Same headers, new rows
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Table {
            headers: self.headers.clone(),
            country_col: self.country_col,
            date_col: self.date_col,
            days_col: self.days_col,
            records,
        }
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b',')
            .quote(b'"')
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let find = |name: &str| headers.iter().position(|h| h == name);
        let country_col =
            find(COUNTRY_COLUMN).ok_or_else(|| CleanError::MissingColumn(COUNTRY_COLUMN.to_string()))?;
        let date_col =
            find(DATE_COLUMN).ok_or_else(|| CleanError::MissingColumn(DATE_COLUMN.to_string()))?;
        let days_col = find(DAYS_AGO_COLUMN);

        let mut records = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let row = result?;
            let values: Vec<String> = row.iter().map(str::to_string).collect();

            let country = values
                .get(country_col)
                .filter(|c| !c.is_empty())
                .cloned();
            let date_measured = values.get(date_col).cloned().unwrap_or_default();
            let days_ago = days_col
                .and_then(|idx| values.get(idx))
                .and_then(|v| v.trim().parse::<i64>().ok());

            records.push(Record {
                line_number: i + 1,
                country,
                date_measured,
                days_ago,
                values,
            });
        }

        Ok(Table {
            headers,
            country_col,
            date_col,
            days_col,
            records,
        })
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Writes original columns with cleaned country / date cells and `days_ago`
    /// (replaced in place if the input had it, appended otherwise).
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut headers = self.headers.clone();
        if self.days_col.is_none() {
            headers.push(DAYS_AGO_COLUMN.to_string());
        }
        wtr.write_record(&headers)?;

        for record in &self.records {
            let mut row = record.values.clone();
            row.resize(self.headers.len(), String::new());

            row[self.country_col] = record.country.clone().unwrap_or_default();
            row[self.date_col] = record.date_measured.clone();

            let days = record.days_ago.map(|d| d.to_string()).unwrap_or_default();
            match self.days_col {
                Some(idx) => row[idx] = days,
                None => row.push(days),
            }

            wtr.write_record(&row)?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file)
    }

    /// Distinct non-missing country values, sorted
    pub fn distinct_countries(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter_map(|r| r.country.clone())
            .collect()
    }

    /// SHA-256 over each row's country, date and days_ago.
    /// Two tables with the same cleaned content share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for record in &self.records {
            hasher.update(format!(
                "{}\u{1f}{}\u{1f}{}\u{1e}",
                record.country.as_deref().unwrap_or(""),
                record.date_measured,
                record.days_ago.map(|d| d.to_string()).unwrap_or_default()
            ));
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
