//! Genre normalization
//!
//! Raw artist genres are free text ("canadian pop", "trap latino", ...).
//! The dashboard colors by a small closed set, so every row is folded into
//! one of the canonical genres or the fallback bucket.

/// Folds free-text artist genres into a closed canonical set
#[derive(Debug, Clone)]
pub struct GenreNormalizer {
    /// (configured spelling, lowercase match key), in check order
    canonical: Vec<(String, String)>,
    fallback: String,
}

impl GenreNormalizer {
    pub fn new(canonical: &[String], fallback: &str) -> Self {
        Self {
            canonical: canonical
                .iter()
                .map(|g| (g.clone(), g.to_lowercase()))
                .collect(),
            fallback: fallback.to_string(),
        }
    }

    /// Normalize one genre string
    ///
    /// Canonical genres are checked in order against the *current* value, so an
    /// earlier rewrite can be rewritten again by a later genre it contains
    /// ("trap latino" becomes "trap", and "trap" contains "rap").
    pub fn normalize(&self, raw: &str) -> String {
        let mut current = raw.to_string();
        for (genre, key) in &self.canonical {
            if current.to_lowercase().contains(key.as_str()) {
                current = genre.clone();
            }
        }

        if self.canonical.iter().any(|(genre, _)| *genre == current) {
            current
        } else {
            self.fallback.clone()
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}
