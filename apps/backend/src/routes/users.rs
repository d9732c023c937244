//! User registration and profile endpoints

use axum::{extract::State, Extension, Json};

use crate::error::{ApiError, Result};
use crate::models::{ApiUser, RegisterRequest, RegisterResponse};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/users/register
/// Creates a new user and returns the access token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::Validation("username must not be empty".to_string()));
    }

    let user = state.db.create_user(username).await?;

    tracing::info!("Registered new user: {}", user.username);

    Ok(Json(RegisterResponse {
        user_id: user.id,
        token: user.token,
    }))
}

/// GET /api/users/me
/// Returns the authenticated user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiUser>> {
    let user = state
        .db
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_api_user()))
}
