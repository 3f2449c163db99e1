//! Answer normalization and fuzzy matching for free-text submissions.
//!
//! Match strictness is a tunable policy ([`MatchPolicy`]) rather than a fixed
//! threshold: player-facing answers tolerate case, accents, punctuation, and
//! a length-scaled number of typos.

use serde::Deserialize;

/// Tolerance applied when judging free-text answers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Answers shorter than this allow `short_edits` typos.
    pub short_len: usize,
    /// Edit budget for short answers.
    pub short_edits: usize,
    /// Answers shorter than this (but at least `short_len`) allow `medium_edits`.
    pub medium_len: usize,
    /// Edit budget for medium answers.
    pub medium_edits: usize,
    /// Edit budget for anything longer.
    pub long_edits: usize,
    /// Fraction of an expected continuation that counts as a full answer.
    pub continuation_prefix: f32,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            short_len: 5,
            short_edits: 0,
            medium_len: 10,
            medium_edits: 1,
            long_edits: 2,
            continuation_prefix: 0.6,
        }
    }
}

impl MatchPolicy {
    /// Edit budget allowed for a normalized answer of `len` characters.
    fn allowed_edits(&self, len: usize) -> usize {
        if len < self.short_len {
            self.short_edits
        } else if len < self.medium_len {
            self.medium_edits
        } else {
            self.long_edits
        }
    }

    /// Whether `given` is an acceptable rendition of `expected`.
    pub fn matches(&self, expected: &str, given: &str) -> bool {
        let expected = normalize(expected);
        let given = normalize(given);
        if expected.is_empty() {
            return false;
        }
        if expected == given {
            return true;
        }
        edit_distance(&expected, &given) <= self.allowed_edits(expected.chars().count())
    }

    /// Judge a continuation answer: fuzzy match on the full line, or a long
    /// enough exact prefix of it.
    pub fn continuation_matches(&self, expected: &str, given: &str) -> bool {
        if self.matches(expected, given) {
            return true;
        }
        let expected = normalize(expected);
        let given = normalize(given);
        let needed = (expected.chars().count() as f32 * self.continuation_prefix).ceil() as usize;
        given.chars().count() >= needed.max(1) && expected.starts_with(&given)
    }
}

/// Canonical form used for comparisons and duplicate detection: lowercase,
/// accents folded, everything but letters/digits dropped.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .flat_map(fold_char)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Fold a character to its unaccented lowercase ASCII form where one exists.
fn fold_char(c: char) -> Option<char> {
    let c = c.to_ascii_lowercase();
    let folded = match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'æ' => 'a',
        'œ' => 'o',
        other => other,
    };
    Some(folded)
}

/// Levenshtein distance over chars, single-row dynamic programming.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev + usize::from(ca != cb);
            prev = row[j + 1];
            row[j + 1] = substitute.min(prev + 1).min(row[j] + 1);
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_accents_and_punctuation() {
        assert_eq!(normalize("Beyoncé"), "beyonce");
        assert_eq!(normalize("  The Weeknd!  "), "theweeknd");
        assert_eq!(normalize("AC/DC"), "acdc");
    }

    #[test]
    fn short_answers_are_strict() {
        let policy = MatchPolicy::default();
        assert!(policy.matches("Jul", "jul"));
        assert!(!policy.matches("Jul", "jil"));
    }

    #[test]
    fn longer_answers_tolerate_typos() {
        let policy = MatchPolicy::default();
        assert!(policy.matches("Kendrick Lamar", "kendrik lamar"));
        assert!(policy.matches("Aya Nakamura", "aya nakamoura"));
        assert!(!policy.matches("Kendrick Lamar", "kandrick lamer the third"));
    }

    #[test]
    fn continuation_accepts_long_prefix() {
        let policy = MatchPolicy::default();
        let line = "sous le soleil de minuit on danse encore";
        assert!(policy.continuation_matches(line, "Sous le soleil de minuit on danse"));
        assert!(!policy.continuation_matches(line, "sous le"));
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("abc", "abc"), 0);
        assert_eq!(edit_distance("abc", "abd"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }
}
