//! Dictionary endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::storage;
use crate::AppState;

/// POST /api/dictionaries
/// Imports an uploaded dictionary file and stores it as a private dictionary
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<UploadDictionaryRequest>,
) -> Result<Json<ApiDictionary>> {
    let parsed = wordcards_core::import(payload.content.as_bytes(), &payload.filename)?;

    let dictionary = state
        .db
        .create_dictionary_with_words(auth.user_id, &parsed)
        .await?;

    tracing::info!(
        "Imported dictionary '{}' ({} words) for user {}",
        dictionary.title,
        dictionary.word_count,
        auth.user_id
    );

    // Archive the source file; the dictionary stays usable if archiving fails
    match state
        .storage
        .upload_file(auth.user_id, &payload.filename, payload.content.as_bytes())
        .await
    {
        Ok(key) => {
            let hash = storage::hash_content(payload.content.as_bytes());
            state
                .db
                .set_dictionary_file(dictionary.id, &key, &hash)
                .await?;
        }
        Err(e) => {
            tracing::warn!(
                "Failed to archive upload for dictionary {}: {}",
                dictionary.id,
                e
            );
        }
    }

    Ok(Json(dictionary.to_api_dictionary()))
}

/// GET /api/dictionaries
/// Lists dictionaries the user authored or enrolled in
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<ApiDictionary>>> {
    let dictionaries = state.db.list_my_dictionaries(auth.user_id).await?;

    Ok(Json(
        dictionaries.iter().map(|d| d.to_api_dictionary()).collect(),
    ))
}

/// GET /api/dictionaries/available
/// Lists public dictionaries the user could still enroll in
pub async fn list_available(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<ApiDictionary>>> {
    let dictionaries = state.db.list_available_dictionaries(auth.user_id).await?;

    Ok(Json(
        dictionaries.iter().map(|d| d.to_api_dictionary()).collect(),
    ))
}

/// GET /api/dictionaries/search?q=
/// Searches visible dictionaries by title, word or translation
pub async fn search(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ApiDictionary>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let dictionaries = state.db.search_dictionaries(auth.user_id, q).await?;

    Ok(Json(
        dictionaries.iter().map(|d| d.to_api_dictionary()).collect(),
    ))
}

/// GET /api/dictionaries/{id}
/// Returns one dictionary with its words
pub async fn get_dictionary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(dictionary_id): Path<i64>,
) -> Result<Json<DictionaryDetailResponse>> {
    let dictionary = fetch_visible(&state, dictionary_id, auth.user_id).await?;
    let words = state.db.get_dictionary_words(dictionary_id).await?;

    Ok(Json(DictionaryDetailResponse {
        dictionary: dictionary.to_api_dictionary(),
        words,
    }))
}

/// DELETE /api/dictionaries/{id}
/// Removes a dictionary; only the author may do this
pub async fn delete_dictionary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(dictionary_id): Path<i64>,
) -> Result<StatusCode> {
    let dictionary = fetch_visible(&state, dictionary_id, auth.user_id).await?;
    if dictionary.author_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the author can delete a dictionary".to_string(),
        ));
    }

    state.db.delete_dictionary(dictionary_id).await?;

    tracing::info!(
        "Deleted dictionary {} for user {}",
        dictionary_id,
        auth.user_id
    );

    // The archived source file goes too, but its loss is not an error
    if let Some(key) = &dictionary.file_path {
        if let Err(e) = state.storage.delete_file(key).await {
            tracing::warn!("Failed to delete archived upload {}: {}", key, e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/dictionaries/{id}/status
/// Toggles a dictionary between private and public
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(dictionary_id): Path<i64>,
) -> Result<Json<ApiDictionary>> {
    let dictionary = fetch_visible(&state, dictionary_id, auth.user_id).await?;
    if dictionary.author_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the author can change dictionary visibility".to_string(),
        ));
    }

    let updated = state
        .db
        .set_dictionary_status(dictionary_id, dictionary.status().toggled())
        .await?;

    tracing::info!(
        "Dictionary {} is now {}",
        updated.id,
        updated.status().as_str()
    );

    Ok(Json(updated.to_api_dictionary()))
}

/// POST /api/dictionaries/{id}/students
/// Enrolls the user as a student of a public dictionary
pub async fn enroll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(dictionary_id): Path<i64>,
) -> Result<StatusCode> {
    let dictionary = fetch_visible(&state, dictionary_id, auth.user_id).await?;
    if dictionary.author_id == auth.user_id {
        return Err(ApiError::Validation(
            "Authors cannot enroll in their own dictionary".to_string(),
        ));
    }

    state.db.add_student(dictionary_id, auth.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/dictionaries/{id}/students
/// Drops the user's enrollment; allowed even after the dictionary went private
pub async fn unenroll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(dictionary_id): Path<i64>,
) -> Result<StatusCode> {
    state
        .db
        .get_dictionary(dictionary_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dictionary not found".to_string()))?;

    state.db.remove_student(dictionary_id, auth.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Load a dictionary the user is allowed to see; inaccessible ones are
/// reported as missing rather than forbidden
async fn fetch_visible(state: &AppState, dictionary_id: i64, user_id: i64) -> Result<Dictionary> {
    let dictionary = state
        .db
        .get_dictionary(dictionary_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Dictionary not found".to_string()))?;

    if !dictionary.is_accessible_to(user_id) {
        return Err(ApiError::NotFound("Dictionary not found".to_string()));
    }

    Ok(dictionary)
}
