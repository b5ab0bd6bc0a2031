use crate::{
    AppState,
    auth::Caller,
    dto::{AuthResponse, LoginRequest, SignupRequest, UserResponse},
    errors::ApiError,
    identity::NewUser,
};
use axum::{Json, extract::State};
use validator::Validate;

/// POST /auth/signup
/// Body: { "email": "...", "username": "...", "password": "...", "profile_image_url": "..."? }
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user = state.identity.register(NewUser {
        email: payload.email,
        username: payload.username,
        password: payload.password,
        profile_image_url: payload.profile_image_url,
    })
    .await?;

    let token = state.identity.issue_token(&user)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /auth/login
/// Body: { "email": "...", "password": "..." }
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let user = state
        .identity
        .authenticate(&payload.email, &payload.password)
        .await?;

    let token = state.identity.issue_token(&user)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /users/me
/// Headers: Authorization: Bearer <token>
pub async fn get_current_user(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.identity.get_user(caller.id)?;

    Ok(Json(user.into()))
}
