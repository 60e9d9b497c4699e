// String similarity used by both header matching and product deduplication.
//
// Scores are a normalized Levenshtein ratio. Comparison is exact: callers
// lowercase/trim first when they want case-insensitive matching.

use rapidfuzz::distance::levenshtein;

/// Unit-cost edit distance (insert, delete, substitute) between two strings,
/// counted in characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein::distance(a.chars(), b.chars())
}

/// Similarity in `[0, 1]`: `(max_len - distance) / max_len`, `1.0` for two
/// empty strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    levenshtein::normalized_similarity(a.chars(), b.chars())
}

/// Lowercase + trim, the normalization applied before every fuzzy comparison.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
