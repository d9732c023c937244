//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Re-export shared types from wordcards-core
pub use wordcards_core::types::{
    AnswerDirection, CardStatus, DictionaryStatus, ParsedDictionary, WordEntry,
};
use wordcards_core::CardProgress;

// === Database Entity Types ===

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl User {
    /// Convert to the API shape, which never carries the token
    pub fn to_api_user(&self) -> ApiUser {
        ApiUser {
            id: self.id,
            username: self.username.clone(),
            created_at: self.created_at,
            last_seen_at: self.last_seen_at,
        }
    }
}

/// Dictionary row; every select joins in the word count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dictionary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub note: String,
    pub author_id: i64,
    pub file_path: Option<String>,
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub word_count: i64,
}

impl Dictionary {
    pub fn status(&self) -> DictionaryStatus {
        DictionaryStatus::from_str(&self.status).unwrap_or_default()
    }

    /// A dictionary is usable by its author and, when public, by anyone
    pub fn is_accessible_to(&self, user_id: i64) -> bool {
        self.author_id == user_id || self.status() == DictionaryStatus::Public
    }

    /// Convert to API dictionary type
    pub fn to_api_dictionary(&self) -> ApiDictionary {
        ApiDictionary {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
            status: self.status(),
            note: self.note.clone(),
            author_id: self.author_id,
            word_count: self.word_count,
            created_at: self.created_at,
        }
    }
}

/// Word row, shared between dictionaries through the link table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Word {
    pub id: i64,
    pub body: String,
    pub slug: String,
    pub translations: String,
    pub example: String,
}

/// Lesson row joined with its dictionary title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub dictionary_id: i64,
    pub student_id: i64,
    pub required_answers: i32,
    pub created_at: DateTime<Utc>,
    pub dictionary_title: String,
}

impl Lesson {
    /// Convert to API lesson type
    pub fn to_api_lesson(&self, counts: CardCounts) -> ApiLesson {
        ApiLesson {
            id: self.id,
            dictionary_id: self.dictionary_id,
            dictionary_title: self.dictionary_title.clone(),
            required_answers: self.required_answers,
            counts,
            created_at: self.created_at,
        }
    }
}

/// Card row holding per-lesson progress for one word
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: i64,
    pub lesson_id: i64,
    pub word_id: i64,
    pub status: String,
    pub correct_answers: i32,
    pub all_attempts: i64,
    pub all_correct_answers: i64,
}

impl Card {
    pub fn status(&self) -> CardStatus {
        CardStatus::from_str(&self.status).unwrap_or_default()
    }

    /// Extract the mastery state consumed by wordcards-core
    pub fn progress(&self) -> CardProgress {
        CardProgress {
            status: self.status(),
            correct_answers: self.correct_answers,
            all_attempts: self.all_attempts,
            all_correct_answers: self.all_correct_answers,
        }
    }

    /// Copy of this card with updated progress fields
    pub fn with_progress(&self, progress: &CardProgress) -> Card {
        Card {
            status: progress.status.as_str().to_string(),
            correct_answers: progress.correct_answers,
            all_attempts: progress.all_attempts,
            all_correct_answers: progress.all_correct_answers,
            ..self.clone()
        }
    }

    /// Convert to API card type
    pub fn to_api_card(&self, word: &Word) -> ApiCard {
        ApiCard {
            id: self.id,
            lesson_id: self.lesson_id,
            word: word.clone(),
            status: self.status(),
            correct_answers: self.correct_answers,
            all_attempts: self.all_attempts,
            all_correct_answers: self.all_correct_answers,
        }
    }
}

/// Card totals per status for one lesson
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CardCounts {
    pub total: i64,
    pub active: i64,
    pub done: i64,
    pub disabled: i64,
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

// Dictionary types
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadDictionaryRequest {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiDictionary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: DictionaryStatus,
    pub note: String,
    pub author_id: i64,
    pub word_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DictionaryDetailResponse {
    pub dictionary: ApiDictionary,
    pub words: Vec<Word>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

// Lesson types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLessonRequest {
    pub dictionary_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonResponse {
    pub lesson: ApiLesson,
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiLesson {
    pub id: i64,
    pub dictionary_id: i64,
    pub dictionary_title: String,
    pub required_answers: i32,
    pub counts: CardCounts,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetRequiredAnswersRequest {
    pub required_answers: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextCardQuery {
    pub visited: Option<String>,
}

/// Outcome tag of a draw request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOutcome {
    Ok,
    NoActiveCards,
    PassComplete,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextCardResponse {
    pub status: DrawOutcome,
    pub card: Option<ApiCard>,
    pub has_more: bool,
    /// Updated visited list the client passes into the next draw
    pub visited: Vec<i64>,
}

// Card types
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiCard {
    pub id: i64,
    pub lesson_id: i64,
    pub word: Word,
    pub status: CardStatus,
    pub correct_answers: i32,
    pub all_attempts: i64,
    pub all_correct_answers: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
    #[serde(default)]
    pub direction: AnswerDirection,
}

/// Outcome tag of an answer check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub result: AnswerOutcome,
    pub message: String,
    pub card: ApiCard,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetCardStatusRequest {
    pub status: CardStatus,
}
