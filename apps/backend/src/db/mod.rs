//! SQLite database operations

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;
use wordcards_core::scheduler::{apply_status_change, score_answer, ScoreResult};
use wordcards_core::DEFAULT_REQUIRED_ANSWERS;

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the SQLite database, creating the file if needed
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with a generated bearer token
    pub async fn create_user(&self, username: &str) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, token, created_at, last_seen_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, token, created_at, last_seen_at
            "#,
        )
        .bind(username)
        .bind(&token)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Validation(format!("username '{}' is already taken", username))
            }
            _ => ApiError::Database(e),
        })?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, token, created_at, last_seen_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by bearer token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, token, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_seen_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Dictionary Repository ===

    /// Persist a parsed dictionary with its words and links in one
    /// transaction; a failure leaves no partial rows behind
    pub async fn create_dictionary_with_words(
        &self,
        author_id: i64,
        parsed: &ParsedDictionary,
    ) -> Result<Dictionary> {
        let mut tx = self.pool.begin().await?;

        let dictionary_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO dictionaries (title, slug, status, author_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&parsed.title)
        .bind(&parsed.slug)
        .bind(DictionaryStatus::default().as_str())
        .bind(author_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for word in &parsed.words {
            let word_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO words (body, slug, translations, example)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(&word.body)
            .bind(&word.slug)
            .bind(&word.translations)
            .bind(&word.example)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO dictionary_words (dictionary_id, word_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(dictionary_id)
            .bind(word_id)
            .execute(&mut *tx)
            .await?;
        }

        let dictionary = sqlx::query_as::<_, Dictionary>(
            r#"
            SELECT d.id, d.title, d.slug, d.status, d.note, d.author_id,
                   d.file_path, d.content_hash, d.created_at,
                   (SELECT COUNT(*) FROM dictionary_words dw
                    WHERE dw.dictionary_id = d.id) AS word_count
            FROM dictionaries d
            WHERE d.id = $1
            "#,
        )
        .bind(dictionary_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(dictionary)
    }

    /// Record where the uploaded source file was archived
    pub async fn set_dictionary_file(
        &self,
        dictionary_id: i64,
        file_path: &str,
        content_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE dictionaries
            SET file_path = $1, content_hash = $2
            WHERE id = $3
            "#,
        )
        .bind(file_path)
        .bind(content_hash)
        .bind(dictionary_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get dictionary by ID with its word count
    pub async fn get_dictionary(&self, dictionary_id: i64) -> Result<Option<Dictionary>> {
        let dictionary = sqlx::query_as::<_, Dictionary>(
            r#"
            SELECT d.id, d.title, d.slug, d.status, d.note, d.author_id,
                   d.file_path, d.content_hash, d.created_at,
                   (SELECT COUNT(*) FROM dictionary_words dw
                    WHERE dw.dictionary_id = d.id) AS word_count
            FROM dictionaries d
            WHERE d.id = $1
            "#,
        )
        .bind(dictionary_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dictionary)
    }

    /// Dictionaries the user authored, plus public ones they enrolled in
    pub async fn list_my_dictionaries(&self, user_id: i64) -> Result<Vec<Dictionary>> {
        let dictionaries = sqlx::query_as::<_, Dictionary>(
            r#"
            SELECT d.id, d.title, d.slug, d.status, d.note, d.author_id,
                   d.file_path, d.content_hash, d.created_at,
                   (SELECT COUNT(*) FROM dictionary_words dw
                    WHERE dw.dictionary_id = d.id) AS word_count
            FROM dictionaries d
            WHERE d.author_id = $1
               OR (d.status = 'public' AND EXISTS (
                       SELECT 1 FROM dictionary_students ds
                       WHERE ds.dictionary_id = d.id AND ds.student_id = $1))
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dictionaries)
    }

    /// Public dictionaries the user neither authored nor enrolled in
    pub async fn list_available_dictionaries(&self, user_id: i64) -> Result<Vec<Dictionary>> {
        let dictionaries = sqlx::query_as::<_, Dictionary>(
            r#"
            SELECT d.id, d.title, d.slug, d.status, d.note, d.author_id,
                   d.file_path, d.content_hash, d.created_at,
                   (SELECT COUNT(*) FROM dictionary_words dw
                    WHERE dw.dictionary_id = d.id) AS word_count
            FROM dictionaries d
            WHERE d.status = 'public'
              AND d.author_id != $1
              AND NOT EXISTS (
                      SELECT 1 FROM dictionary_students ds
                      WHERE ds.dictionary_id = d.id AND ds.student_id = $1)
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dictionaries)
    }

    /// Substring search over titles, word bodies and translations, limited
    /// to dictionaries the user can see
    pub async fn search_dictionaries(&self, user_id: i64, query: &str) -> Result<Vec<Dictionary>> {
        let escaped = query
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", escaped);

        let dictionaries = sqlx::query_as::<_, Dictionary>(
            r#"
            SELECT DISTINCT d.id, d.title, d.slug, d.status, d.note, d.author_id,
                   d.file_path, d.content_hash, d.created_at,
                   (SELECT COUNT(*) FROM dictionary_words dw
                    WHERE dw.dictionary_id = d.id) AS word_count
            FROM dictionaries d
            LEFT JOIN dictionary_words dw ON dw.dictionary_id = d.id
            LEFT JOIN words w ON w.id = dw.word_id
            WHERE (d.author_id = $1 OR d.status = 'public')
              AND (LOWER(d.title) LIKE $2 ESCAPE '\'
                   OR LOWER(w.body) LIKE $2 ESCAPE '\'
                   OR LOWER(w.translations) LIKE $2 ESCAPE '\')
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(dictionaries)
    }

    /// Set dictionary visibility and return the updated row
    pub async fn set_dictionary_status(
        &self,
        dictionary_id: i64,
        status: DictionaryStatus,
    ) -> Result<Dictionary> {
        sqlx::query(
            r#"
            UPDATE dictionaries
            SET status = $1
            WHERE id = $2
            "#,
        )
        .bind(status.as_str())
        .bind(dictionary_id)
        .execute(&self.pool)
        .await?;

        self.get_dictionary(dictionary_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("dictionary {}", dictionary_id)))
    }

    /// Delete a dictionary together with its lessons, cards, enrollment
    /// rows and any words that belonged only to it
    pub async fn delete_dictionary(&self, dictionary_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM words
            WHERE id IN (
                SELECT dw.word_id FROM dictionary_words dw
                WHERE dw.dictionary_id = $1
                  AND NOT EXISTS (
                      SELECT 1 FROM dictionary_words other
                      WHERE other.word_id = dw.word_id
                        AND other.dictionary_id != $1))
            "#,
        )
        .bind(dictionary_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM dictionaries WHERE id = $1")
            .bind(dictionary_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Words of one dictionary, ordered for display
    pub async fn get_dictionary_words(&self, dictionary_id: i64) -> Result<Vec<Word>> {
        let words = sqlx::query_as::<_, Word>(
            r#"
            SELECT w.id, w.body, w.slug, w.translations, w.example
            FROM words w
            JOIN dictionary_words dw ON dw.word_id = w.id
            WHERE dw.dictionary_id = $1
            ORDER BY w.body
            "#,
        )
        .bind(dictionary_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(words)
    }

    // === Enrollment Repository ===

    /// Enroll a student; enrolling twice is a no-op
    pub async fn add_student(&self, dictionary_id: i64, student_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO dictionary_students (dictionary_id, student_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(dictionary_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a student's enrollment
    pub async fn remove_student(&self, dictionary_id: i64, student_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM dictionary_students
            WHERE dictionary_id = $1 AND student_id = $2
            "#,
        )
        .bind(dictionary_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Lesson Repository ===

    /// Fetch the student's lesson for a dictionary, creating it on first
    /// use. Creation materializes one card per word with fresh counters,
    /// in the same transaction.
    pub async fn get_or_create_lesson(
        &self,
        dictionary_id: i64,
        student_id: i64,
    ) -> Result<(Lesson, bool)> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query(
            r#"
            INSERT OR IGNORE INTO lessons (dictionary_id, student_id, required_answers, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(dictionary_id)
        .bind(student_id)
        .bind(DEFAULT_REQUIRED_ANSWERS)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            SELECT l.id, l.dictionary_id, l.student_id, l.required_answers, l.created_at,
                   d.title AS dictionary_title
            FROM lessons l
            JOIN dictionaries d ON d.id = l.dictionary_id
            WHERE l.dictionary_id = $1 AND l.student_id = $2
            "#,
        )
        .bind(dictionary_id)
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;

        if created {
            sqlx::query(
                r#"
                INSERT INTO cards (lesson_id, word_id)
                SELECT $1, dw.word_id
                FROM dictionary_words dw
                WHERE dw.dictionary_id = $2
                "#,
            )
            .bind(lesson.id)
            .bind(dictionary_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok((lesson, created))
    }

    /// Get lesson by ID
    pub async fn get_lesson(&self, lesson_id: i64) -> Result<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            SELECT l.id, l.dictionary_id, l.student_id, l.required_answers, l.created_at,
                   d.title AS dictionary_title
            FROM lessons l
            JOIN dictionaries d ON d.id = l.dictionary_id
            WHERE l.id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    /// Update the correct-answer threshold of a lesson
    pub async fn set_required_answers(
        &self,
        lesson_id: i64,
        required_answers: i32,
    ) -> Result<Lesson> {
        sqlx::query(
            r#"
            UPDATE lessons
            SET required_answers = $1
            WHERE id = $2
            "#,
        )
        .bind(required_answers)
        .bind(lesson_id)
        .execute(&self.pool)
        .await?;

        self.get_lesson(lesson_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("lesson {}", lesson_id)))
    }

    /// Card totals per status for one lesson
    pub async fn card_status_counts(&self, lesson_id: i64) -> Result<CardCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM cards
            WHERE lesson_id = $1
            GROUP BY status
            "#,
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = CardCounts::default();
        for (status, count) in rows {
            counts.total += count;
            match CardStatus::from_str(&status) {
                Some(CardStatus::Active) => counts.active = count,
                Some(CardStatus::Done) => counts.done = count,
                Some(CardStatus::Disable) => counts.disabled = count,
                None => {}
            }
        }

        Ok(counts)
    }

    // === Card Repository ===

    /// Get card by ID
    pub async fn get_card(&self, card_id: i64) -> Result<Option<Card>> {
        let card = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, lesson_id, word_id, status, correct_answers,
                   all_attempts, all_correct_answers
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Get word by ID
    pub async fn get_word(&self, word_id: i64) -> Result<Option<Word>> {
        let word = sqlx::query_as::<_, Word>(
            r#"
            SELECT id, body, slug, translations, example
            FROM words
            WHERE id = $1
            "#,
        )
        .bind(word_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(word)
    }

    /// Ids of cards still in rotation for a lesson
    pub async fn get_active_card_ids(&self, lesson_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM cards
            WHERE lesson_id = $1 AND status = $2
            ORDER BY id
            "#,
        )
        .bind(lesson_id)
        .bind(CardStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Score an answer against a card inside one read-modify-write
    /// transaction; the updated progress is persisted whatever the outcome
    pub async fn score_card_answer(
        &self,
        card_id: i64,
        answer: &str,
        direction: AnswerDirection,
    ) -> Result<(ScoreResult, Card, Word)> {
        let mut tx = self.pool.begin().await?;

        let card = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, lesson_id, word_id, status, correct_answers,
                   all_attempts, all_correct_answers
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("card {}", card_id)))?;

        let word = sqlx::query_as::<_, Word>(
            r#"
            SELECT id, body, slug, translations, example
            FROM words
            WHERE id = $1
            "#,
        )
        .bind(card.word_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(format!("word {} missing for card {}", card.word_id, card.id))
        })?;

        let required_answers =
            sqlx::query_scalar::<_, i32>("SELECT required_answers FROM lessons WHERE id = $1")
                .bind(card.lesson_id)
                .fetch_one(&mut *tx)
                .await?;

        let reference = match direction {
            AnswerDirection::Forward => word.translations.as_str(),
            AnswerDirection::Reverse => word.body.as_str(),
        };
        let result = score_answer(&card.progress(), required_answers, answer, reference);

        sqlx::query(
            r#"
            UPDATE cards
            SET status = $1, correct_answers = $2, all_attempts = $3, all_correct_answers = $4
            WHERE id = $5
            "#,
        )
        .bind(result.progress.status.as_str())
        .bind(result.progress.correct_answers)
        .bind(result.progress.all_attempts)
        .bind(result.progress.all_correct_answers)
        .bind(card_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let updated = card.with_progress(&result.progress);
        Ok((result, updated, word))
    }

    /// Apply a manual card status change inside one transaction
    pub async fn set_card_status(
        &self,
        card_id: i64,
        new_status: CardStatus,
    ) -> Result<(Card, Word)> {
        let mut tx = self.pool.begin().await?;

        let card = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, lesson_id, word_id, status, correct_answers,
                   all_attempts, all_correct_answers
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(card_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("card {}", card_id)))?;

        let word = sqlx::query_as::<_, Word>(
            r#"
            SELECT id, body, slug, translations, example
            FROM words
            WHERE id = $1
            "#,
        )
        .bind(card.word_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(format!("word {} missing for card {}", card.word_id, card.id))
        })?;

        let required_answers =
            sqlx::query_scalar::<_, i32>("SELECT required_answers FROM lessons WHERE id = $1")
                .bind(card.lesson_id)
                .fetch_one(&mut *tx)
                .await?;

        let progress = apply_status_change(&card.progress(), new_status, required_answers);

        sqlx::query(
            r#"
            UPDATE cards
            SET status = $1, correct_answers = $2, all_attempts = $3, all_correct_answers = $4
            WHERE id = $5
            "#,
        )
        .bind(progress.status.as_str())
        .bind(progress.correct_answers)
        .bind(progress.all_attempts)
        .bind(progress.all_correct_answers)
        .bind(card_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((card.with_progress(&progress), word))
    }
}
