use crate::{
    auth::{self, Claims},
    directory::{DirectoryError, UserDirectory},
    models::{Author, User},
};
use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user already exists")]
    UserAlreadyExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    NotFound,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token error: {0}")]
    Token(String),
}

pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub profile_image_url: Option<String>,
}

pub struct IdentitySettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub default_avatar_url: String,
}

/// In-process identity provider: accounts, password checks, session tokens,
/// and the public profile directory the feed joins against.
pub struct IdentityProvider {
    users: DashMap<Uuid, User>,
    email_index: DashMap<String, Uuid>,
    // Keyed by lowercase username
    username_index: DashMap<String, Uuid>,
    settings: IdentitySettings,
}

impl IdentityProvider {
    pub fn new(settings: IdentitySettings) -> Self {
        Self {
            users: DashMap::new(),
            email_index: DashMap::new(),
            username_index: DashMap::new(),
            settings,
        }
    }

    pub async fn register(&self, new_user: NewUser) -> Result<User, IdentityError> {
        let cost = self.settings.bcrypt_cost;
        let password = new_user.password;
        let hashed_password = run_blocking(move || hash(password, cost)).await?;

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            hashed_password,
            profile_image_url: new_user
                .profile_image_url
                .unwrap_or_else(|| self.settings.default_avatar_url.clone()),
            created_at: Utc::now().timestamp(),
        };

        match self.email_index.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(IdentityError::UserAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        match self.username_index.entry(user.username.to_lowercase()) {
            Entry::Occupied(_) => {
                self.email_index.remove(&user.email);
                return Err(IdentityError::UserAlreadyExists);
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        self.users.insert(user.id, user.clone());

        info!("New user registered: {}", user.email);

        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        let user_id = *self
            .email_index
            .get(email)
            .ok_or(IdentityError::InvalidCredentials)?;

        let user = self
            .users
            .get(&user_id)
            .map(|u| u.clone())
            .ok_or(IdentityError::InvalidCredentials)?;

        let password = password.to_string();
        let hashed = user.hashed_password.clone();
        let valid = run_blocking(move || verify(password, &hashed)).await?;

        if !valid {
            return Err(IdentityError::InvalidCredentials);
        }

        info!("User logged in: {}", user.email);

        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<User, IdentityError> {
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or(IdentityError::NotFound)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, IdentityError> {
        auth::create_token(
            &user.id,
            &user.email,
            self.settings.token_ttl,
            &self.settings.jwt_secret,
        )
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, IdentityError> {
        auth::decode_token(token, &self.settings.jwt_secret)
    }
}

/// bcrypt is slow by construction; run it on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, IdentityError>
where
    F: FnOnce() -> Result<T, bcrypt::BcryptError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| IdentityError::Hashing(e.to_string()))?
        .map_err(|e| IdentityError::Hashing(e.to_string()))
}

#[async_trait]
impl UserDirectory for IdentityProvider {
    async fn get_by_id(&self, id: Uuid) -> Result<Author, DirectoryError> {
        self.users
            .get(&id)
            .map(|user| Author::from(&*user))
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }

    async fn get_many_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Author>, DirectoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|user| (*id, Author::from(&*user))))
            .collect())
    }

    async fn get_by_username(&self, username: &str) -> Result<Author, DirectoryError> {
        let user_id = *self
            .username_index
            .get(&username.to_lowercase())
            .ok_or_else(|| DirectoryError::NotFound(username.to_string()))?;

        self.get_by_id(user_id).await
    }
}
