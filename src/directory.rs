use crate::models::Author;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the identity provider's public profiles.
///
/// Pass-through boundary: implementations do not cache and do not retry.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Author, DirectoryError>;

    /// Resolves a batch in one round trip. Unknown ids are simply absent from
    /// the returned map.
    async fn get_many_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Author>, DirectoryError>;

    async fn get_by_username(&self, username: &str) -> Result<Author, DirectoryError>;
}
