//! Core vocabulary-learning library.
//!
//! This library provides:
//! - Dictionary upload parsing (XML card lists) with format dispatch
//! - Free-text answer matching for drill scoring
//! - The per-card mastery state machine and random card selection
//! - Shared domain types used across the backend

pub mod error;
pub mod importer;
pub mod matching;
pub mod scheduler;
pub mod types;

pub use error::{ImportError, Result};
pub use importer::{import, DEFAULT_TITLE};
pub use matching::{match_answer, MatchResult};
pub use scheduler::{
    apply_status_change, draw_next_card, score_answer, CardProgress, NextCard, ScoreResult,
    DEFAULT_REQUIRED_ANSWERS, MAX_REQUIRED_ANSWERS, MIN_REQUIRED_ANSWERS,
};
pub use types::{AnswerDirection, CardStatus, DictionaryStatus, ParsedDictionary, WordEntry};
