// 🧾 Audit trail - every rewrite is an event
//
// Each pipeline run gets a UUID. Alias rewrites, fuzzy rewrites, dropped rows and
// skipped dates are appended as events so a reviewer can trace why a country changed.
// Persisting to SQLite is optional; the in-memory log is always returned.

use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStage {
    /// Exact alias rule applied
    Alias,

    /// Fuzzy pass rewrote the string
    Fuzzy,

    /// Row excluded for empty / missing country
    DroppedEmpty,

    /// Row excluded for an unparsable date (skip policy only)
    DateSkipped,
}

impl AuditStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStage::Alias => "alias",
            AuditStage::Fuzzy => "fuzzy",
            AuditStage::DroppedEmpty => "dropped_empty",
            AuditStage::DateSkipped => "date_skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "alias" => Some(AuditStage::Alias),
            "fuzzy" => Some(AuditStage::Fuzzy),
            "dropped_empty" => Some(AuditStage::DroppedEmpty),
            "date_skipped" => Some(AuditStage::DateSkipped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub stage: AuditStage,

    /// Value before the stage touched it (raw date for `DateSkipped`)
    pub original: String,

    /// Value after; `None` for exclusions
    pub replacement: Option<String>,

    /// Fuzzy score, when one was computed
    pub score: Option<u8>,

    pub rows_affected: usize,
}

/// Summary row for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub recorded_at: DateTime<Utc>,
    pub scorer: String,
    pub threshold: u8,
    pub rows_in: usize,
    pub rows_out: usize,
    pub input_fingerprint: String,
    pub output_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub run_id: String,
    pub events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        AuditLog {
            run_id: uuid::Uuid::new_v4().to_string(),
            events: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        stage: AuditStage,
        original: &str,
        replacement: Option<&str>,
        score: Option<u8>,
        rows_affected: usize,
    ) {
        self.events.push(AuditEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            run_id: self.run_id.clone(),
            timestamp: Utc::now(),
            stage,
            original: original.to_string(),
            replacement: replacement.map(str::to_string),
            score,
            rows_affected,
        });
    }

    pub fn by_stage(&self, stage: AuditStage) -> Vec<&AuditEvent> {
        self.events.iter().filter(|e| e.stage == stage).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub fn setup_audit_store(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            recorded_at TEXT NOT NULL,
            scorer TEXT NOT NULL,
            threshold INTEGER NOT NULL,
            rows_in INTEGER NOT NULL,
            rows_out INTEGER NOT NULL,
            input_fingerprint TEXT NOT NULL,
            output_fingerprint TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS audit_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            run_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            stage TEXT NOT NULL,
            original TEXT NOT NULL,
            replacement TEXT,
            score INTEGER,
            rows_affected INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_events_run ON audit_events(run_id)",
        [],
    )?;

    Ok(())
}

/// Store the run summary and all its events in one transaction
pub fn save_run(conn: &mut Connection, run: &RunRecord, log: &AuditLog) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO runs (
            run_id, recorded_at, scorer, threshold, rows_in, rows_out,
            input_fingerprint, output_fingerprint
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run.run_id,
            run.recorded_at.to_rfc3339(),
            run.scorer,
            run.threshold,
            run.rows_in as i64,
            run.rows_out as i64,
            run.input_fingerprint,
            run.output_fingerprint,
        ],
    )?;

    for event in &log.events {
        tx.execute(
            "INSERT INTO audit_events (
                event_id, run_id, timestamp, stage, original, replacement, score, rows_affected
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.event_id,
                event.run_id,
                event.timestamp.to_rfc3339(),
                event.stage.as_str(),
                event.original,
                event.replacement,
                event.score,
                event.rows_affected as i64,
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Events for one run, in insertion order
pub fn get_events_for_run(conn: &Connection, run_id: &str) -> Result<Vec<AuditEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, run_id, timestamp, stage, original, replacement, score, rows_affected
         FROM audit_events
         WHERE run_id = ?1
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![run_id], |row| {
            let timestamp_str: String = row.get(2)?;
            let stage_str: String = row.get(3)?;
            let rows_affected: i64 = row.get(7)?;

            Ok(AuditEvent {
                event_id: row.get(0)?,
                run_id: row.get(1)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                stage: AuditStage::parse(&stage_str).ok_or(rusqlite::Error::InvalidQuery)?,
                original: row.get(4)?,
                replacement: row.get(5)?,
                score: row.get(6)?,
                rows_affected: rows_affected as usize,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn count_runs(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================
