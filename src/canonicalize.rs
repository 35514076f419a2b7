// 🎯 Fuzzy Canonicalizer - collapse near-matches onto one canonical label
//
// One pass per label:
//   1. score every distinct string in the pool against the label (and its variants)
//   2. accept everything at or above the threshold
//   3. hand back the rewrite mapping + what was considered, for the audit trail
//
// Which strings enter the pool (claimed strings, other labels) is the pipeline's call.

use crate::config::CanonicalLabel;
use crate::similarity::{SimilarityScorer, TokenSortRatio};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    pub candidate: String,
    pub score: u8,

    /// Label or variant that produced the best score
    pub matched_target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub label: String,

    /// Top-N candidates by score (score desc, then candidate asc)
    pub considered: Vec<FuzzyMatch>,

    /// Every candidate at or above threshold, excluding the label itself
    pub accepted: Vec<FuzzyMatch>,
}

impl PassReport {
    /// candidate → label for every accepted candidate
    pub fn mapping(&self) -> HashMap<String, String> {
        self.accepted
            .iter()
            .map(|m| (m.candidate.clone(), self.label.clone()))
            .collect()
    }

    pub fn is_noop(&self) -> bool {
        self.accepted.is_empty()
    }
}

pub struct FuzzyCanonicalizer {
    scorer: Box<dyn SimilarityScorer>,
    threshold: u8,
    report_limit: usize,
}

impl FuzzyCanonicalizer {
    pub fn new(scorer: Box<dyn SimilarityScorer>, threshold: u8, report_limit: usize) -> Self {
        FuzzyCanonicalizer {
            scorer,
            threshold,
            report_limit,
        }
    }

    pub fn with_threshold(threshold: u8) -> Self {
        Self::new(Box::new(TokenSortRatio), threshold, crate::config::DEFAULT_REPORT_LIMIT)
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Best score of `candidate` against the label and its variants.
    /// Ties go to the earlier target (label before variants).
    pub fn best_score<'a>(&self, candidate: &str, label: &'a CanonicalLabel) -> (u8, &'a str) {
        let mut best: (u8, &str) = (0, label.label.as_str());
        for target in label.targets() {
            let score = self.scorer.score(candidate, target);
            if score > best.0 {
                best = (score, target);
            }
        }
        best
    }

    /// Score the pool against one label. Never fails; no match is an empty `accepted`.
    pub fn canonicalize_to(&self, pool: &BTreeSet<String>, label: &CanonicalLabel) -> PassReport {
        let mut scored: Vec<FuzzyMatch> = pool
            .iter()
            .map(|candidate| {
                let (score, target) = self.best_score(candidate, label);
                debug!(label = %label.label, candidate = %candidate, score, "scored candidate");
                FuzzyMatch {
                    candidate: candidate.clone(),
                    score,
                    matched_target: target.to_string(),
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.candidate.cmp(&b.candidate)));

        let accepted: Vec<FuzzyMatch> = scored
            .iter()
            .filter(|m| m.score >= self.threshold && m.candidate != label.label)
            .cloned()
            .collect();

        for m in &accepted {
            info!(
                label = %label.label,
                candidate = %m.candidate,
                score = m.score,
                via = %m.matched_target,
                "fuzzy rewrite accepted"
            );
        }

        scored.truncate(self.report_limit);

        PassReport {
            label: label.label.clone(),
            considered: scored,
            accepted,
        }
    }
}

impl Default for FuzzyCanonicalizer {
    fn default() -> Self {
        Self::with_threshold(crate::config::DEFAULT_THRESHOLD)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores from a fixed table; anything unknown scores 0
    struct FixedScorer(HashMap<(&'static str, &'static str), u8>);

    impl SimilarityScorer for FixedScorer {
        fn score(&self, a: &str, b: &str) -> u8 {
            self.0
                .iter()
                .find(|((x, y), _)| *x == a && *y == b)
                .map(|(_, s)| *s)
                .unwrap_or(0)
        }
    }

    fn pool(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accepts_at_or_above_threshold() {
        let canonicalizer = FuzzyCanonicalizer::default();
        let label = CanonicalLabel::new("united kingdom");

        let report = canonicalizer.canonicalize_to(
            &pool(&["kingdom united", "united kingdm", "united kingdom", "france"]),
            &label,
        );

        let mapping = report.mapping();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["kingdom united"], "united kingdom");
        assert_eq!(mapping["united kingdm"], "united kingdom");
        assert!(!mapping.contains_key("france"));
        // Label itself is considered but not a rewrite
        assert!(!mapping.contains_key("united kingdom"));
        assert_eq!(report.considered[0].score, 100);
    }

    #[test]
    fn test_no_match_is_noop() {
        let canonicalizer = FuzzyCanonicalizer::default();
        let label = CanonicalLabel::new("south africa");

        let report = canonicalizer.canonicalize_to(&pool(&["france", "germany"]), &label);

        assert!(report.is_noop());
        assert!(report.mapping().is_empty());
        assert_eq!(report.considered.len(), 2);
    }

    #[test]
    fn test_empty_pool() {
        let canonicalizer = FuzzyCanonicalizer::default();
        let report = canonicalizer.canonicalize_to(&BTreeSet::new(), &CanonicalLabel::new("south africa"));

        assert!(report.is_noop());
        assert!(report.considered.is_empty());
    }

    #[test]
    fn test_threshold_boundary() {
        let scorer = FixedScorer(HashMap::from([
            (("exactly", "target"), 90),
            (("just under", "target"), 89),
        ]));
        let canonicalizer = FuzzyCanonicalizer::new(Box::new(scorer), 90, 5);

        let report = canonicalizer.canonicalize_to(&pool(&["exactly", "just under"]), &CanonicalLabel::new("target"));

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].candidate, "exactly");
    }

    #[test]
    fn test_variant_match_rewrites_to_label() {
        let canonicalizer = FuzzyCanonicalizer::default();
        let label = CanonicalLabel::with_variants("united kingdom", &["britain"]);

        let report = canonicalizer.canonicalize_to(&pool(&["britan", "great britain"]), &label);

        let mapping = report.mapping();
        assert_eq!(mapping.get("britan").map(String::as_str), Some("united kingdom"));
        let m = report.accepted.iter().find(|m| m.candidate == "britan").unwrap();
        assert_eq!(m.matched_target, "britain");
    }

    #[test]
    fn test_considered_is_limited_and_ordered() {
        let scorer = FixedScorer(HashMap::from([
            (("a", "t"), 50),
            (("b", "t"), 70),
            (("c", "t"), 70),
            (("d", "t"), 10),
        ]));
        let canonicalizer = FuzzyCanonicalizer::new(Box::new(scorer), 90, 2);

        let report = canonicalizer.canonicalize_to(&pool(&["a", "b", "c", "d"]), &CanonicalLabel::new("t"));

        let names: Vec<&str> = report.considered.iter().map(|m| m.candidate.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_scorer_name_exposed() {
        assert_eq!(FuzzyCanonicalizer::default().scorer_name(), "token_sort_ratio");
    }
}
