use crate::{
    AppState,
    auth::Caller,
    dto::CreatePostRequest,
    errors::ApiError,
    models::{Post, PostWithAuthor},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::ValidationError(format!("Invalid {what} id")))
}

/// POST /posts
/// Headers: Authorization: Bearer <token>
/// Body: { "content": "..." }
pub async fn create_post(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.posts.create(caller, &payload.content).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts
pub async fn get_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostWithAuthor>>, ApiError> {
    Ok(Json(state.posts.list_all().await?))
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostWithAuthor>, ApiError> {
    let id = parse_id(&id, "post")?;

    Ok(Json(state.posts.get_by_id(id).await?))
}

/// GET /users/{user_id}/posts
pub async fn get_posts_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostWithAuthor>>, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    Ok(Json(state.posts.list_by_author(user_id).await?))
}
