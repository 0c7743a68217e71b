//! Text normalization shared by every mutation path and by search.

use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

/// NFC-canonicalizes, collapses whitespace runs to one space and trims.
pub fn normalize(s: &str) -> String {
    let canonical: String = s.nfc().collect();
    canonical.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accepts letters, digits, whitespace, `·`, `-`, `(` and `)`. Empty input is rejected.
pub fn is_allowed_text(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_alphabetic()
                || c.is_numeric()
                || c.is_whitespace()
                || matches!(c, '·' | '-' | '(' | ')')
        })
}

/// Case-folded form used for duplicate checks and substring search.
pub fn fold(s: &str) -> String {
    normalize(s).to_lowercase()
}

/// Collation used for every sorted list.
///
/// Precomposed Hangul syllables are laid out in dictionary order, so a case-folded
/// codepoint comparison matches Korean collation for the names this tool stores.
/// Ties fall back to the raw strings so the order is total.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

pub fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    fold(haystack).contains(folded_needle)
}
