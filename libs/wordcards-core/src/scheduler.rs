//! Card selection and per-card mastery state.
//!
//! A lesson drills cards in passes: each pass draws active cards one by one,
//! uniformly at random, never repeating a card the caller has already
//! visited. Scoring moves a card towards the lesson's required-answers
//! threshold and retires it when the threshold is reached.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::matching::{match_answer, MatchResult};
use crate::types::CardStatus;

/// Default number of correct answers needed to retire a card.
pub const DEFAULT_REQUIRED_ANSWERS: i32 = 5;
/// Lower bound for a lesson's required-answers setting.
pub const MIN_REQUIRED_ANSWERS: i32 = 1;
/// Upper bound for a lesson's required-answers setting.
pub const MAX_REQUIRED_ANSWERS: i32 = 10;

/// Mastery state of one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardProgress {
    pub status: CardStatus,
    /// Correct answers towards the lesson threshold; reset by reactivation.
    pub correct_answers: i32,
    /// Lifetime number of attempts, never reset.
    pub all_attempts: i64,
    /// Lifetime number of correct answers, never reset.
    pub all_correct_answers: i64,
}

impl Default for CardProgress {
    fn default() -> Self {
        CardProgress {
            status: CardStatus::Active,
            correct_answers: 0,
            all_attempts: 0,
            all_correct_answers: 0,
        }
    }
}

/// Outcome of drawing the next card for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextCard {
    /// A card was picked. `has_more` is true when unvisited active cards
    /// remain beyond the picked one.
    Drawn { card_id: i64, has_more: bool },
    /// The lesson has no active cards at all.
    NothingActive,
    /// Every active card has been visited; the pass is over.
    PassComplete,
}

/// Pick one active card uniformly at random, excluding visited ids.
///
/// An empty `active_ids` means the lesson has nothing to drill, which is
/// different from every active card having been visited this pass.
pub fn draw_next_card<R: Rng + ?Sized>(
    active_ids: &[i64],
    visited: &[i64],
    rng: &mut R,
) -> NextCard {
    if active_ids.is_empty() {
        return NextCard::NothingActive;
    }

    let candidates: Vec<i64> = active_ids
        .iter()
        .copied()
        .filter(|id| !visited.contains(id))
        .collect();

    match candidates.choose(rng) {
        Some(&card_id) => NextCard::Drawn {
            card_id,
            has_more: candidates.len() > 1,
        },
        None => NextCard::PassComplete,
    }
}

/// Outcome of scoring one answer.
#[derive(Debug, Clone)]
pub struct ScoreResult {
    /// The match decision with normalized forms.
    pub matched: MatchResult,
    /// Updated progress to persist. Updated on wrong answers too.
    pub progress: CardProgress,
    /// True when this answer reached the threshold and retired the card.
    pub became_done: bool,
}

impl ScoreResult {
    pub fn is_correct(&self) -> bool {
        self.matched.is_correct
    }
}

/// Score one answer against a card.
///
/// Every attempt counts towards `all_attempts`. A correct answer increments
/// both `correct_answers` and `all_correct_answers`, and the card becomes
/// done when `correct_answers` lands exactly on the threshold. The card's
/// current status does not gate scoring.
pub fn score_answer(
    progress: &CardProgress,
    required_answers: i32,
    answer: &str,
    reference: &str,
) -> ScoreResult {
    let mut next = progress.clone();
    next.all_attempts += 1;

    let matched = match_answer(answer, reference);
    let mut became_done = false;

    if matched.is_correct {
        next.correct_answers += 1;
        next.all_correct_answers += 1;
        if next.correct_answers == required_answers {
            next.status = CardStatus::Done;
            became_done = true;
        }
    }

    ScoreResult {
        matched,
        progress: next,
        became_done,
    }
}

/// Apply a manual status change.
///
/// Marking a card done pins its counter at the threshold, so reactivating
/// later restarts from zero. Reactivating a done card resets the counter.
/// Suspending keeps the counter, and so does resuming a suspended card.
pub fn apply_status_change(
    progress: &CardProgress,
    new_status: CardStatus,
    required_answers: i32,
) -> CardProgress {
    let mut next = progress.clone();
    if new_status == CardStatus::Done {
        next.correct_answers = required_answers;
    } else if progress.status == CardStatus::Done && new_status == CardStatus::Active {
        next.correct_answers = 0;
    }
    next.status = new_status;
    next
}
