// 🔁 Alias Resolver - exact literal → canonical label
// Runs before fuzzy matching so known synonyms never depend on a score.
//
// "uk" → "united kingdom", "sa" → "south africa", "america" → "united states of america"

use crate::config::{AliasRule, CanonicalLabel};
use crate::error::{CleanError, Result};
use crate::normalize::TextNormalizer;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Rules in config order, keys already normalized
    rules: Vec<AliasRule>,

    lookup: HashMap<String, String>,
}

impl AliasTable {
    /// Build from config rules.
    ///
    /// Keys are normalized with the pipeline's normalizer so they match what
    /// the resolver will actually see. Rejects:
    /// - targets that are not canonical labels
    /// - one key mapped to two different labels
    /// - a key equal to a canonical label that maps somewhere else
    /// - keys that normalize to the empty string
    pub fn build(
        rules: &[AliasRule],
        labels: &[CanonicalLabel],
        normalizer: &TextNormalizer,
    ) -> Result<Self> {
        let label_set: HashSet<&str> = labels.iter().map(|l| l.label.as_str()).collect();

        let mut table = AliasTable::default();

        for rule in rules {
            if !label_set.contains(rule.canonical.as_str()) {
                return Err(CleanError::Config(format!(
                    "alias {:?} targets unknown canonical label {:?}",
                    rule.alias, rule.canonical
                )));
            }

            let key = normalizer.normalize(&rule.alias);
            if key.is_empty() {
                return Err(CleanError::Config(format!(
                    "alias {:?} is empty after normalization",
                    rule.alias
                )));
            }

            if label_set.contains(key.as_str()) && key != rule.canonical {
                return Err(CleanError::Config(format!(
                    "alias {:?} is itself a canonical label and cannot map to {:?}",
                    key, rule.canonical
                )));
            }

            match table.lookup.get(&key) {
                Some(existing) if existing != &rule.canonical => {
                    return Err(CleanError::Config(format!(
                        "alias {:?} maps to both {:?} and {:?}",
                        key, existing, rule.canonical
                    )));
                }
                // Same rule repeated
                Some(_) => continue,
                None => {}
            }

            table.lookup.insert(key.clone(), rule.canonical.clone());
            table.rules.push(AliasRule {
                alias: key,
                canonical: rule.canonical.clone(),
            });
        }

        Ok(table)
    }

    /// Exact lookup on an already-normalized string
    pub fn resolve<'a>(&'a self, s: &'a str) -> &'a str {
        self.lookup.get(s).map(String::as_str).unwrap_or(s)
    }

    pub fn get(&self, s: &str) -> Option<&str> {
        self.lookup.get(s).map(String::as_str)
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Free-function form of `AliasTable::resolve`
pub fn resolve_aliases(s: &str, table: &AliasTable) -> String {
    table.resolve(s).to_string()
}

// ============================================================================
// TESTS
// ============================================================================
