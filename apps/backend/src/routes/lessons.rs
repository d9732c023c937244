//! Lesson endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;
use wordcards_core::scheduler::{draw_next_card, NextCard};
use wordcards_core::{MAX_REQUIRED_ANSWERS, MIN_REQUIRED_ANSWERS};

/// POST /api/lessons
/// Returns the student's lesson for a dictionary, creating it on first call
pub async fn start_lesson(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<Json<LessonResponse>> {
    let dictionary = state
        .db
        .get_dictionary(payload.dictionary_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dictionary not found".to_string()))?;
    if !dictionary.is_accessible_to(auth.user_id) {
        return Err(ApiError::NotFound("Dictionary not found".to_string()));
    }

    let (lesson, created) = state
        .db
        .get_or_create_lesson(dictionary.id, auth.user_id)
        .await?;

    if created {
        tracing::info!(
            "Started lesson {} on dictionary '{}' for user {}",
            lesson.id,
            dictionary.title,
            auth.user_id
        );
    }

    let counts = state.db.card_status_counts(lesson.id).await?;

    Ok(Json(LessonResponse {
        lesson: lesson.to_api_lesson(counts),
        created,
    }))
}

/// GET /api/lessons/{id}
/// Returns one lesson with its card status counts
pub async fn get_lesson(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<i64>,
) -> Result<Json<ApiLesson>> {
    let lesson = fetch_owned(&state, lesson_id, auth.user_id).await?;
    let counts = state.db.card_status_counts(lesson.id).await?;

    Ok(Json(lesson.to_api_lesson(counts)))
}

/// GET /api/lessons/{id}/next-card?visited=1,2,3
/// Draws a random active card the current pass has not shown yet
pub async fn next_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<i64>,
    Query(query): Query<NextCardQuery>,
) -> Result<Json<NextCardResponse>> {
    let lesson = fetch_owned(&state, lesson_id, auth.user_id).await?;

    let visited = parse_visited(query.visited.as_deref())?;
    let active_ids = state.db.get_active_card_ids(lesson.id).await?;

    // ThreadRng is not Send, so it must not live across an await
    let drawn = {
        let mut rng = rand::rng();
        draw_next_card(&active_ids, &visited, &mut rng)
    };

    let response = match drawn {
        NextCard::Drawn { card_id, has_more } => {
            let card = state
                .db
                .get_card(card_id)
                .await?
                .ok_or_else(|| ApiError::Internal(format!("card {} vanished mid-draw", card_id)))?;
            let word = state.db.get_word(card.word_id).await?.ok_or_else(|| {
                ApiError::Internal(format!("word {} missing for card {}", card.word_id, card.id))
            })?;

            let mut visited = visited;
            visited.push(card_id);

            NextCardResponse {
                status: DrawOutcome::Ok,
                card: Some(card.to_api_card(&word)),
                has_more,
                visited,
            }
        }
        NextCard::NothingActive => NextCardResponse {
            status: DrawOutcome::NoActiveCards,
            card: None,
            has_more: false,
            visited,
        },
        NextCard::PassComplete => NextCardResponse {
            status: DrawOutcome::PassComplete,
            card: None,
            has_more: false,
            visited: Vec::new(),
        },
    };

    Ok(Json(response))
}

/// PUT /api/lessons/{id}/required-answers
/// Changes how many correct answers graduate a card
pub async fn set_required_answers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<i64>,
    Json(payload): Json<SetRequiredAnswersRequest>,
) -> Result<Json<ApiLesson>> {
    fetch_owned(&state, lesson_id, auth.user_id).await?;

    if !(MIN_REQUIRED_ANSWERS..=MAX_REQUIRED_ANSWERS).contains(&payload.required_answers) {
        return Err(ApiError::Validation(format!(
            "required_answers must be between {} and {}",
            MIN_REQUIRED_ANSWERS, MAX_REQUIRED_ANSWERS
        )));
    }

    let lesson = state
        .db
        .set_required_answers(lesson_id, payload.required_answers)
        .await?;
    let counts = state.db.card_status_counts(lesson.id).await?;

    Ok(Json(lesson.to_api_lesson(counts)))
}

/// Comma separated card ids from the query string
fn parse_visited(raw: Option<&str>) -> Result<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = part.parse::<i64>().map_err(|_| {
            ApiError::Validation(format!("invalid card id in visited list: {}", part))
        })?;
        ids.push(id);
    }

    Ok(ids)
}

/// Load a lesson and check it belongs to the requesting student
async fn fetch_owned(state: &AppState, lesson_id: i64, user_id: i64) -> Result<Lesson> {
    let lesson = state
        .db
        .get_lesson(lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    if lesson.student_id != user_id {
        return Err(ApiError::Forbidden(
            "Lesson belongs to another student".to_string(),
        ));
    }

    Ok(lesson)
}
