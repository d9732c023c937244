//! Card endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/cards/{id}/answer
/// Checks an answer against the card's word and records the attempt
pub async fn answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(card_id): Path<i64>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>> {
    check_card_owner(&state, card_id, auth.user_id).await?;

    let (result, card, word) = state
        .db
        .score_card_answer(card_id, &payload.answer, payload.direction)
        .await?;

    if result.became_done {
        tracing::info!("Card {} learned in lesson {}", card.id, card.lesson_id);
    }

    let (outcome, message) = if result.became_done {
        (AnswerOutcome::Correct, "Card learned")
    } else if result.is_correct() {
        (AnswerOutcome::Correct, "That is the right answer")
    } else {
        (AnswerOutcome::Incorrect, "That is the wrong answer")
    };

    Ok(Json(AnswerResponse {
        result: outcome,
        message: message.to_string(),
        card: card.to_api_card(&word),
    }))
}

/// PUT /api/cards/{id}/status
/// Applies a manual status change to a card
pub async fn set_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(card_id): Path<i64>,
    Json(payload): Json<SetCardStatusRequest>,
) -> Result<Json<ApiCard>> {
    check_card_owner(&state, card_id, auth.user_id).await?;

    let (card, word) = state.db.set_card_status(card_id, payload.status).await?;

    Ok(Json(card.to_api_card(&word)))
}

/// Check the card's lesson belongs to the requesting student
async fn check_card_owner(state: &AppState, card_id: i64, user_id: i64) -> Result<()> {
    let card = state
        .db
        .get_card(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;

    let lesson = state.db.get_lesson(card.lesson_id).await?.ok_or_else(|| {
        ApiError::Internal(format!(
            "lesson {} missing for card {}",
            card.lesson_id, card.id
        ))
    })?;

    if lesson.student_id != user_id {
        return Err(ApiError::Forbidden(
            "Card belongs to another student".to_string(),
        ));
    }

    Ok(())
}
