//! Answer matching for drill scoring.
//!
//! Translation fields usually hold several synonyms separated by commas or
//! other punctuation. Matching is substring containment over normalized
//! text, so typing any one synonym counts as a correct answer.

use serde::{Deserialize, Serialize};

/// Tokens stripped from both sides before comparison.
const NOISE_TOKENS: [&str; 12] = [
    ",", ";", "...", "|", "\n", "\t", "\u{2018}", "\u{2019}", "\u{201c}", "\u{201d}", "'", "\"",
];

/// Outcome of checking a free-text answer against a reference phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the answer counts as correct.
    pub is_correct: bool,
    /// The answer after normalization.
    pub answer_normalized: String,
    /// The reference after normalization.
    pub reference_normalized: String,
}

/// Check a free-text answer against a reference phrase.
///
/// Both sides are lower-cased, noise tokens are replaced with spaces and
/// whitespace runs are collapsed. The answer is correct when its normalized
/// form is non-empty and appears as a substring of the normalized reference.
/// Substring containment accepts partial words: "cat" matches "category".
pub fn match_answer(answer: &str, reference: &str) -> MatchResult {
    let answer_normalized = normalize(answer);
    let reference_normalized = normalize(reference);

    let is_correct =
        !answer_normalized.is_empty() && reference_normalized.contains(&answer_normalized);

    MatchResult {
        is_correct,
        answer_normalized,
        reference_normalized,
    }
}

fn normalize(s: &str) -> String {
    let mut text = s.to_lowercase();
    for token in NOISE_TOKENS {
        text = text.replace(token, " ");
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
