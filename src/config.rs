// ⚙️ Cleaning configuration - Rules as Data
// Canonical labels, alias rules, threshold and date layout live in JSON, not in code.
//
// Every field has a default matching the store-income extract this tool was built for,
// so `{}` is a valid config file.

use crate::error::{CleanError, Result as CleanResult};
use crate::normalize::{TextNormalizer, DEFAULT_BOUNDARY_CHARS};
use anyhow::{Context as AnyhowContext, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_THRESHOLD: u8 = 90;
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";
pub const DEFAULT_REPORT_LIMIT: usize = 5;

// ============================================================================
// CANONICAL LABELS + ALIAS RULES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalLabel {
    /// Target string every match is rewritten to
    pub label: String,

    /// Extra fuzzy targets; a match against a variant still rewrites to `label`
    #[serde(default)]
    pub variants: Vec<String>,
}

impl CanonicalLabel {
    pub fn new(label: &str) -> Self {
        CanonicalLabel {
            label: label.to_string(),
            variants: Vec::new(),
        }
    }

    pub fn with_variants(label: &str, variants: &[&str]) -> Self {
        CanonicalLabel {
            label: label.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Label first, then variants
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.label.as_str()).chain(self.variants.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    /// Exact literal as it appears after normalization
    pub alias: String,

    /// Canonical label it resolves to
    pub canonical: String,
}

impl AliasRule {
    pub fn new(alias: &str, canonical: &str) -> Self {
        AliasRule {
            alias: alias.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

/// What to do with a row whose `date_measured` does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateErrorPolicy {
    /// Fail the whole run on the first bad date
    #[default]
    Abort,

    /// Exclude the row, record the error, keep going
    SkipRow,
}

// ============================================================================
// CLEANING CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Processed in this order; earlier labels win ties
    pub canonical_labels: Vec<CanonicalLabel>,

    /// Applied as one pass before any fuzzy matching
    pub aliases: Vec<AliasRule>,

    /// Minimum score (0-100) for a fuzzy rewrite
    pub threshold: u8,

    /// Characters trimmed from both ends besides whitespace
    pub boundary_chars: Vec<char>,

    /// chrono layout for `date_measured`
    pub date_format: String,

    pub on_date_error: DateErrorPolicy,

    /// How many top candidates each fuzzy pass reports
    pub report_limit: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        CleaningConfig {
            canonical_labels: vec![
                CanonicalLabel::with_variants("united kingdom", &["britain"]),
                CanonicalLabel::new("united states of america"),
                CanonicalLabel::new("south africa"),
            ],
            aliases: vec![
                AliasRule::new("america", "united states of america"),
                AliasRule::new("united states", "united states of america"),
                AliasRule::new("united  states of america", "united states of america"),
                AliasRule::new("britain", "united kingdom"),
                AliasRule::new("u.k", "united kingdom"),
                AliasRule::new("uk", "united kingdom"),
                AliasRule::new("england", "united kingdom"),
                AliasRule::new("s.a", "south africa"),
                AliasRule::new("sa", "south africa"),
                AliasRule::new("s. africasouth africa", "south africa"),
            ],
            threshold: DEFAULT_THRESHOLD,
            boundary_chars: DEFAULT_BOUNDARY_CHARS.to_vec(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            on_date_error: DateErrorPolicy::Abort,
            report_limit: DEFAULT_REPORT_LIMIT,
        }
    }
}

impl CleaningConfig {
    /// Load config from JSON file (missing fields fall back to defaults)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: CleaningConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))?;

        Ok(config)
    }

    pub fn normalizer(&self) -> TextNormalizer {
        TextNormalizer::new(self.boundary_chars.clone())
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.canonical_labels.iter().map(|l| l.label.as_str()).collect()
    }

    /// Structural checks. Alias-level checks happen in `AliasTable::build`.
    pub fn validate(&self) -> CleanResult<()> {
        if self.threshold > 100 {
            return Err(CleanError::Config(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }

        if self.canonical_labels.is_empty() {
            return Err(CleanError::Config("at least one canonical label is required".to_string()));
        }

        if self.date_format.trim().is_empty() {
            return Err(CleanError::Config("date_format must not be empty".to_string()));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(CleanError::Config(format!(
                "date_format {:?} is not a valid chrono layout",
                self.date_format
            )));
        }

        // A label that changes under normalization would be rewritten on a second run
        let normalizer = self.normalizer();
        let mut seen = HashSet::new();
        for label in &self.canonical_labels {
            if label.label.is_empty() {
                return Err(CleanError::Config("canonical label must not be empty".to_string()));
            }
            if normalizer.normalize(&label.label) != label.label {
                return Err(CleanError::Config(format!(
                    "canonical label {:?} is not in normalized form",
                    label.label
                )));
            }
            if !seen.insert(label.label.as_str()) {
                return Err(CleanError::Config(format!(
                    "canonical label {:?} listed twice",
                    label.label
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
