use crate::{AppState, directory::UserDirectory, errors::ApiError, models::Author};
use axum::{
    Json,
    extract::{Path, State},
};

/// GET /profiles/{username}
/// Accepts the handle with or without a single leading `@`.
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Author>, ApiError> {
    let username = username.trim();
    let username = username.strip_prefix('@').unwrap_or(username);
    if username.is_empty() {
        return Err(ApiError::ValidationError("Username is required".into()));
    }

    let author = state.identity.get_by_username(username).await?;

    Ok(Json(author))
}
