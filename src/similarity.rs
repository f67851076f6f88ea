//! Fuzzy address matching for quake origins.
//!
//! Both sides are normalized (lowercase, punctuation to spaces, common
//! Philippine address abbreviations expanded, separators dropped) and then
//! compared with a length-normalized Levenshtein distance.
//!
//! Similarity metric: percentage in [0.0, 100.0]; identical normalized
//! strings (including two empty ones) score 100.

use strsim::levenshtein;

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("st", "street"),
    ("st.", "street"),
    ("rd", "road"),
    ("rd.", "road"),
    ("ave", "avenue"),
    ("ave.", "avenue"),
    ("blk", "block"),
    ("brgy", "barangay"),
    ("ph", "phase"),
    ("subd", "subdivision"),
];

fn expand(token: &str) -> &str {
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, full)| *full)
        .unwrap_or(token)
}

/// Normalize a free-text address into a single separator-free token stream.
pub fn normalize_address(s: &str) -> String {
    let lowered = s.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(expand).collect()
}

/// `(1 - levenshtein / max_len) * 100` over already-normalized strings.
pub fn levenshtein_percent(a: &str, b: &str) -> f64 {
    if a == b {
        return 100.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let dist = levenshtein(a, b) as f64;
    (1.0 - dist / max_len as f64) * 100.0
}

/// Similarity of two raw address strings in percent.
pub fn address_similarity(a: &str, b: &str) -> f64 {
    levenshtein_percent(&normalize_address(a), &normalize_address(b))
}
