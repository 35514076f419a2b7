// ✂️ Text Normalizer - lowercase + boundary trimming
//
// "  U.K. " → "u.k"   "/south africa/" → "south africa"
//
// Trimming runs to a fixpoint over whitespace AND the boundary set, so
// "uk /" and "/ uk" both land on "uk" and normalize(normalize(s)) == normalize(s).

/// Boundary characters stripped by default (besides whitespace)
pub const DEFAULT_BOUNDARY_CHARS: [char; 2] = ['/', '.'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNormalizer {
    boundary_chars: Vec<char>,
}

impl TextNormalizer {
    pub fn new(boundary_chars: Vec<char>) -> Self {
        TextNormalizer { boundary_chars }
    }

    /// Lowercase, then strip whitespace and boundary characters from both ends.
    /// Interior characters are never touched.
    pub fn normalize(&self, s: &str) -> String {
        s.to_lowercase()
            .trim_matches(|c: char| c.is_whitespace() || self.boundary_chars.contains(&c))
            .to_string()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        TextNormalizer::new(DEFAULT_BOUNDARY_CHARS.to_vec())
    }
}

/// Normalize with the default boundary set (`/` and `.`)
pub fn normalize(s: &str) -> String {
    TextNormalizer::default().normalize(s)
}

// ============================================================================
// TESTS
// ============================================================================
