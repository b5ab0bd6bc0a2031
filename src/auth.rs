use crate::{AppState, errors::ApiError, identity::IdentityError};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub email: String,
    pub exp: usize,
}

pub fn create_token(
    user_id: &Uuid,
    email: &str,
    ttl: Duration,
    secret: &str,
) -> Result<String, IdentityError> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .map(|at| at.timestamp())
        .and_then(|ts| usize::try_from(ts).ok())
        .ok_or_else(|| IdentityError::Token("Failed to calculate expiration".into()))?;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| IdentityError::Token(format!("Token Creation failed: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, IdentityError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| IdentityError::Token(e.to_string()))
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Authenticated caller for the current request.
///
/// Handlers take this as an argument and hand it to the service explicitly;
/// a request without a valid session is rejected with 401 before the
/// handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;

        let claims = state
            .identity
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized)?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

        Ok(Caller { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let id = Uuid::new_v4();
        let token = create_token(&id, "a@example.com", Duration::hours(1), "one").unwrap();

        assert!(decode_token(&token, "two").is_err());
        assert_eq!(decode_token(&token, "one").unwrap().sub, id.to_string());
    }

    #[test]
    fn expired_token_is_rejected() {
        let id = Uuid::new_v4();
        let token = create_token(&id, "a@example.com", Duration::hours(-2), "one").unwrap();

        assert!(decode_token(&token, "one").is_err());
    }
}
