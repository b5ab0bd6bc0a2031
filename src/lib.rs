//! Social post feed API.
//!
//! Users sign up, post short text messages, and read a global or per-author
//! chronological feed. Posts are joined with their author's public profile
//! on every read.

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    http::StatusCode,
    routing::{get, post},
};
use tower::{ServiceBuilder, limit::ConcurrencyLimitLayer, timeout::TimeoutLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod config;
pub mod directory;
pub mod dto;
pub mod errors;
pub mod identity;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod service;
pub mod states;
pub mod store;

pub use config::Config;
pub use states::AppState;

use routes::{
    create_post, get_current_user, get_post, get_posts, get_posts_by_user, get_user_by_username,
    health_check, login, signup,
};

/// Compact human-readable logs, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Builds the router with every route and the middleware stack.
pub fn app(state: AppState, config: &Config) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests));

    Router::new()
        // Public routes (no auth required)
        .route("/health", get(health_check))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/posts", get(get_posts).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/users/{user_id}/posts", get(get_posts_by_user))
        .route("/profiles/{username}", get(get_user_by_username))
        // Protected routes (auth required)
        .route("/users/me", get(get_current_user))
        .with_state(state)
        .layer(middleware)
        .layer(cors)
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(serde_json::json!({ "error": "Request timed out" })),
        )
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Internal server error" })),
        )
    }
}
