// 📏 Similarity scoring - pluggable scorer + token-sort ratio
//
// "kingdom united" vs "united kingdom" → 100 (word order ignored)
// "united kingdm"  vs "united kingdom" → 96  (spelling still counts)

/// Anything that can score two strings on a 0-100 scale
pub trait SimilarityScorer {
    fn score(&self, a: &str, b: &str) -> u8;

    /// Name used in reports and audit events
    fn name(&self) -> &str {
        "custom"
    }
}

/// Token-sort ratio: split into tokens, sort, rejoin, then compare with an
/// edit-distance ratio where a substitution counts as delete + insert.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

impl SimilarityScorer for TokenSortRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a = sorted_tokens(a);
        let b = sorted_tokens(b);
        ratio(&a, &b)
    }

    fn name(&self) -> &str {
        "token_sort_ratio"
    }
}

/// Lowercase, turn punctuation into separators, sort tokens, join with one space
pub fn sorted_tokens(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Normalized indel ratio on 0-100. Empty input on either side scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0;
    }

    let total = (len_a + len_b) as f64;
    let distance = weighted_levenshtein(a, b, 2) as f64;
    (100.0 * (total - distance) / total).round() as u8
}

/// Levenshtein distance (unit costs)
///
/// Minimum number of single-character insertions, deletions and
/// substitutions to turn one string into the other.
pub fn levenshtein(a: &str, b: &str) -> usize {
    weighted_levenshtein(a, b, 1)
}

fn weighted_levenshtein(a: &str, b: &str, substitution_cost: usize) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Two rolling rows instead of the full matrix
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { substitution_cost };

            curr[j + 1] = std::cmp::min(
                std::cmp::min(
                    prev[j + 1] + 1, // deletion
                    curr[j] + 1,     // insertion
                ),
                prev[j] + cost, // substitution
            );
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

// ============================================================================
// TESTS
// ============================================================================
