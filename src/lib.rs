// Country Cleaner - Core Library
// Canonicalizes a free-text country column and derives days-since-measurement

pub mod error;
pub mod normalize;
pub mod similarity;
pub mod config;
pub mod alias;
pub mod canonicalize;
pub mod recency;
pub mod table;
pub mod audit;
pub mod pipeline;
pub mod report;
pub mod logging;

// Re-export commonly used types
pub use error::{CleanError, DateParseError};
pub use normalize::{normalize, TextNormalizer};
pub use similarity::{levenshtein, SimilarityScorer, TokenSortRatio};
pub use config::{AliasRule, CanonicalLabel, CleaningConfig, DateErrorPolicy};
pub use alias::{resolve_aliases, AliasTable};
pub use canonicalize::{FuzzyCanonicalizer, FuzzyMatch, PassReport};
pub use recency::{days_ago, parse_measured_date};
pub use table::{Record, Table};
pub use audit::{
    AuditEvent, AuditLog, AuditStage, RunRecord,
    setup_audit_store, save_run, get_events_for_run, count_runs,
};
pub use pipeline::{AliasRewrite, Pipeline, PipelineOutput, PipelineReport};
pub use report::{render_report, render_table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
