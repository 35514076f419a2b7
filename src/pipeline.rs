// 🧹 Cleaning Pipeline - Normalize → Alias → Fuzzy (per label) → Drop empty → Recency
//
// Each stage takes the full record set by value and hands back a new one.
// Nothing reads ahead, nothing backtracks, and no table is shared between stages.
//
// Running the pipeline on its own output is a no-op:
// - normalized strings normalize to themselves
// - alias targets are canonical labels, which never appear as keys for another label
// - canonical labels only ever score 100 against themselves and are kept out of other passes

use crate::alias::AliasTable;
use crate::audit::{AuditLog, AuditStage, RunRecord};
use crate::canonicalize::{FuzzyCanonicalizer, PassReport};
use crate::config::{CleaningConfig, DateErrorPolicy};
use crate::error::{CleanError, DateParseError, Result};
use crate::normalize::TextNormalizer;
use crate::recency::{days_ago, parse_measured_date};
use crate::similarity::{SimilarityScorer, TokenSortRatio};
use crate::table::{Record, Table};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{info, warn};

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRewrite {
    pub alias: String,
    pub canonical: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub scorer: String,
    pub threshold: u8,
    pub reference_date: NaiveDate,

    /// chrono layout dates are parsed with; the report prints `reference_date` in it
    pub date_format: String,
    pub rows_in: usize,
    pub rows_out: usize,

    pub alias_rewrites: Vec<AliasRewrite>,

    /// One entry per canonical label, in label order
    pub passes: Vec<PassReport>,

    pub dropped_empty: usize,

    /// Only populated under `DateErrorPolicy::SkipRow`
    pub date_errors: Vec<DateParseError>,

    pub distinct_countries: usize,

    /// Non-empty values that matched no label
    pub unresolved: Vec<String>,

    pub input_fingerprint: String,
    pub output_fingerprint: String,
}

impl PipelineReport {
    pub fn run_record(&self) -> RunRecord {
        RunRecord {
            run_id: self.run_id.clone(),
            recorded_at: Utc::now(),
            scorer: self.scorer.clone(),
            threshold: self.threshold,
            rows_in: self.rows_in,
            rows_out: self.rows_out,
            input_fingerprint: self.input_fingerprint.clone(),
            output_fingerprint: self.output_fingerprint.clone(),
        }
    }

    pub fn fuzzy_rewrites(&self) -> usize {
        self.passes.iter().map(|p| p.accepted.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: Table,
    pub report: PipelineReport,
    pub audit: AuditLog,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    config: CleaningConfig,
    normalizer: TextNormalizer,
    aliases: AliasTable,
    canonicalizer: FuzzyCanonicalizer,
}

impl Pipeline {
    /// Pipeline with the default token-sort scorer
    pub fn new(config: CleaningConfig) -> Result<Self> {
        Self::with_scorer(config, Box::new(TokenSortRatio))
    }

    pub fn with_scorer(config: CleaningConfig, scorer: Box<dyn SimilarityScorer>) -> Result<Self> {
        config.validate()?;

        let normalizer = config.normalizer();
        let aliases = AliasTable::build(&config.aliases, &config.canonical_labels, &normalizer)?;
        let canonicalizer = FuzzyCanonicalizer::new(scorer, config.threshold, config.report_limit);

        Ok(Pipeline {
            config,
            normalizer,
            aliases,
            canonicalizer,
        })
    }

    /// Run every stage over `table`. The input is left untouched.
    pub fn run(&self, table: &Table, reference: NaiveDate) -> Result<PipelineOutput> {
        let mut audit = AuditLog::new();

        info!(
            run_id = %audit.run_id,
            rows = table.len(),
            labels = self.config.canonical_labels.len(),
            aliases = self.aliases.len(),
            threshold = self.config.threshold,
            "starting cleaning run"
        );

        let records = self.normalize_stage(table.records.clone());
        let (records, alias_rewrites) = self.alias_stage(records, &mut audit);
        let (records, passes) = self.canonicalize_stage(records, &mut audit);
        let (records, dropped_empty) = self.drop_empty_stage(records, &mut audit);
        let (records, date_errors) = self.recency_stage(records, reference, &mut audit)?;

        let cleaned = table.with_records(records);

        let labels: HashSet<&str> = self.config.label_names().into_iter().collect();
        let distinct = cleaned.distinct_countries();
        let unresolved: Vec<String> = distinct
            .iter()
            .filter(|c| !labels.contains(c.as_str()))
            .cloned()
            .collect();

        let report = PipelineReport {
            run_id: audit.run_id.clone(),
            scorer: self.canonicalizer.scorer_name().to_string(),
            threshold: self.config.threshold,
            reference_date: reference,
            date_format: self.config.date_format.clone(),
            rows_in: table.len(),
            rows_out: cleaned.len(),
            alias_rewrites,
            passes,
            dropped_empty,
            date_errors,
            distinct_countries: distinct.len(),
            unresolved,
            input_fingerprint: table.fingerprint(),
            output_fingerprint: cleaned.fingerprint(),
        };

        info!(
            run_id = %report.run_id,
            rows_out = report.rows_out,
            distinct = report.distinct_countries,
            unresolved = report.unresolved.len(),
            "cleaning run finished"
        );

        Ok(PipelineOutput {
            table: cleaned,
            report,
            audit,
        })
    }

    // ========================================================================
    // STAGES
    // ========================================================================

    /// Lowercase + boundary trim. Missing stays missing.
    pub fn normalize_stage(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .map(|mut r| {
                r.country = r.country.map(|c| self.normalizer.normalize(&c));
                r
            })
            .collect()
    }

    /// One resolution pass over the alias table
    pub fn alias_stage(&self, records: Vec<Record>, audit: &mut AuditLog) -> (Vec<Record>, Vec<AliasRewrite>) {
        let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();

        let records = records
            .into_iter()
            .map(|mut r| {
                if let Some(country) = r.country.as_deref() {
                    if let Some(canonical) = self.aliases.get(country) {
                        if canonical != country {
                            *counts
                                .entry((country.to_string(), canonical.to_string()))
                                .or_insert(0) += 1;
                            r.country = Some(canonical.to_string());
                        }
                    }
                }
                r
            })
            .collect();

        let rewrites: Vec<AliasRewrite> = counts
            .into_iter()
            .map(|((alias, canonical), rows)| {
                audit.record(AuditStage::Alias, &alias, Some(&canonical), None, rows);
                AliasRewrite { alias, canonical, rows }
            })
            .collect();

        info!(rules_hit = rewrites.len(), "alias stage done");
        (records, rewrites)
    }

    /// One fuzzy pass per canonical label, in label order.
    ///
    /// The pool for a pass is every distinct non-empty country currently present,
    /// minus every *other* canonical label. Strings claimed by an earlier pass are
    /// now that earlier label, so they drop out automatically.
    pub fn canonicalize_stage(
        &self,
        mut records: Vec<Record>,
        audit: &mut AuditLog,
    ) -> (Vec<Record>, Vec<PassReport>) {
        let mut passes = Vec::with_capacity(self.config.canonical_labels.len());

        for label in &self.config.canonical_labels {
            let pool: BTreeSet<String> = records
                .iter()
                .filter_map(|r| r.country.as_deref())
                .filter(|c| !c.is_empty())
                .filter(|c| *c == label.label || !self.is_canonical(c))
                .map(str::to_string)
                .collect();

            let pass = self.canonicalizer.canonicalize_to(&pool, label);
            let mapping = pass.mapping();

            let mut rows_per_candidate: BTreeMap<String, usize> = BTreeMap::new();
            records = records
                .into_iter()
                .map(|mut r| {
                    if let Some(target) = r.country.as_ref().and_then(|c| mapping.get(c)) {
                        if let Some(old) = r.country.replace(target.clone()) {
                            *rows_per_candidate.entry(old).or_insert(0) += 1;
                        }
                    }
                    r
                })
                .collect();

            for m in &pass.accepted {
                let rows = rows_per_candidate.get(&m.candidate).copied().unwrap_or(0);
                audit.record(AuditStage::Fuzzy, &m.candidate, Some(&pass.label), Some(m.score), rows);
            }

            info!(
                label = %pass.label,
                pool = pool.len(),
                accepted = pass.accepted.len(),
                "fuzzy pass done"
            );

            passes.push(pass);
        }

        (records, passes)
    }

    /// Exclude rows whose country is missing or empty after normalization
    pub fn drop_empty_stage(&self, records: Vec<Record>, audit: &mut AuditLog) -> (Vec<Record>, usize) {
        let before = records.len();
        let kept: Vec<Record> = records.into_iter().filter(Record::has_country).collect();
        let dropped = before - kept.len();

        if dropped > 0 {
            warn!(dropped, "rows dropped for empty or missing country");
            audit.record(AuditStage::DroppedEmpty, "", None, None, dropped);
        }

        (kept, dropped)
    }

    /// Parse dates and derive `days_ago`. Bad dates abort or skip per policy.
    pub fn recency_stage(
        &self,
        records: Vec<Record>,
        reference: NaiveDate,
        audit: &mut AuditLog,
    ) -> Result<(Vec<Record>, Vec<DateParseError>)> {
        let mut kept = Vec::with_capacity(records.len());
        let mut errors = Vec::new();

        for mut record in records {
            match parse_measured_date(&record.date_measured, &self.config.date_format, record.line_number) {
                Ok(measured) => {
                    let days = days_ago(measured, reference);
                    if days < 0 {
                        warn!(
                            line = record.line_number,
                            date = %record.date_measured,
                            days,
                            "measurement date is after the reference date"
                        );
                    }
                    record.days_ago = Some(days);
                    kept.push(record);
                }
                Err(err) => match self.config.on_date_error {
                    DateErrorPolicy::Abort => return Err(CleanError::DateParse(err)),
                    DateErrorPolicy::SkipRow => {
                        warn!(error = %err, "row skipped for unparsable date");
                        audit.record(AuditStage::DateSkipped, &err.value, None, None, 1);
                        errors.push(err);
                    }
                },
            }
        }

        Ok((kept, errors))
    }

    fn is_canonical(&self, s: &str) -> bool {
        self.config.canonical_labels.iter().any(|l| l.label == s)
    }
}

// ============================================================================
// TESTS
// ============================================================================
