//! Shared domain types.

use serde::{Deserialize, Serialize};

/// Visibility of a dictionary.
///
/// Private dictionaries are usable only by their author; public ones can
/// be studied by any user who enrolls in them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryStatus {
    Private,
    Public,
}

impl Default for DictionaryStatus {
    fn default() -> Self {
        DictionaryStatus::Private
    }
}

impl DictionaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DictionaryStatus::Private => "private",
            DictionaryStatus::Public => "public",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "private" => Some(DictionaryStatus::Private),
            "public" => Some(DictionaryStatus::Public),
            _ => None,
        }
    }

    /// The opposite visibility, used by the publish/unpublish toggle.
    pub fn toggled(self) -> Self {
        match self {
            DictionaryStatus::Private => DictionaryStatus::Public,
            DictionaryStatus::Public => DictionaryStatus::Private,
        }
    }
}

/// Drill eligibility of a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// In rotation: the card can be drawn and scored.
    Active,
    /// Mastered: excluded from drawing.
    Done,
    /// Suspended by the student: excluded from drawing.
    Disable,
}

impl Default for CardStatus {
    fn default() -> Self {
        CardStatus::Active
    }
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "active",
            CardStatus::Done => "done",
            CardStatus::Disable => "disable",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CardStatus::Active),
            "done" => Some(CardStatus::Done),
            "disable" => Some(CardStatus::Disable),
            _ => None,
        }
    }
}

/// Which side of a card an answer is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerDirection {
    /// The word is shown and the answer is checked against its translations.
    Forward,
    /// The translations are shown and the answer is checked against the word.
    Reverse,
}

impl Default for AnswerDirection {
    fn default() -> Self {
        AnswerDirection::Forward
    }
}

/// One vocabulary entry parsed from an uploaded dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    /// The word or phrase being learned.
    pub body: String,
    /// URL-safe form of the body.
    pub slug: String,
    /// Translations as free text; may be empty.
    pub translations: String,
    /// Usage example; may be empty.
    pub example: String,
}

/// A parsed dictionary that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDictionary {
    pub title: String,
    /// URL-safe form of the title; uniqueness is not guaranteed.
    pub slug: String,
    pub words: Vec<WordEntry>,
}
