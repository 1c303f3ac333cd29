//! Normalized substring matching against historical ledger records.
//!
//! Pure functions, no I/O. Candidates are assumed pre-ordered
//! most-recent-first by the caller; matching preserves that order and
//! never re-sorts. Identical inputs always yield identical output: there
//! is no randomness and no locale-dependent case folding beyond simple
//! lowercasing.

use crate::model::Expense;

/// Characters ignored during comparison: ASCII and typographic quote
/// marks, dash variants, Hebrew geresh/gershayim, and combining
/// diacritics (Latin accents and Hebrew niqqud/cantillation).
const fn is_ignored(c: char) -> bool {
    matches!(
        c,
        '\'' | '"'
            | '`'
            | '\u{00B4}'
            | '\u{2018}'
            | '\u{2019}'
            | '\u{201C}'
            | '\u{201D}'
            | '-'
            | '\u{2013}'
            | '\u{2014}'
            | '\u{05F3}'
            | '\u{05F4}'
            | '\u{0300}'..='\u{036F}'
            | '\u{0591}'..='\u{05C7}'
    )
}

/// Strip ignored characters, trim, lowercase.
#[must_use]
pub fn normalize(s: &str) -> String {
    let stripped: String = s.chars().filter(|c| !is_ignored(*c)).collect();
    stripped.trim().to_lowercase()
}

/// All candidates whose normalized item name contains the normalized
/// search term, in the caller's order.
#[must_use]
pub fn find_matches<'a>(term: &str, candidates: &'a [Expense]) -> Vec<&'a Expense> {
    let needle = normalize(term);
    candidates
        .iter()
        .filter(|e| normalize(&e.item).contains(&needle))
        .collect()
}

/// The first (most recent, given caller ordering) matching candidate.
#[must_use]
pub fn find_first<'a>(term: &str, candidates: &'a [Expense]) -> Option<&'a Expense> {
    let needle = normalize(term);
    candidates
        .iter()
        .find(|e| normalize(&e.item).contains(&needle))
}
