use crate::{
    auth::Caller,
    directory::{DirectoryError, UserDirectory},
    models::{Post, PostWithAuthor},
    rate_limit::RateLimit,
    store::{PostStore, StoreError},
};
use chrono::Utc;
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MAX_POST_CHARS: usize = 280;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0}")]
    Validation(String),

    #[error("rate limited")]
    RateLimited,

    #[error("post not found")]
    NotFound,

    #[error("{0}")]
    InternalConsistency(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Feed reads and post creation.
///
/// Every read joins posts to their author profiles in a single batched
/// directory call. A post whose author cannot be resolved fails the whole
/// read with [`PostError::InternalConsistency`].
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
    directory: Arc<dyn UserDirectory>,
    limiter: Arc<dyn RateLimit>,
    feed_limit: usize,
}

impl PostService {
    pub fn new(
        store: Arc<dyn PostStore>,
        directory: Arc<dyn UserDirectory>,
        limiter: Arc<dyn RateLimit>,
        feed_limit: usize,
    ) -> Self {
        Self {
            store,
            directory,
            limiter,
            feed_limit,
        }
    }

    /// Newest posts across all authors, at most `feed_limit` of them.
    pub async fn list_all(&self) -> Result<Vec<PostWithAuthor>, PostError> {
        let posts = self.store.list_recent(self.feed_limit).await?;
        self.with_authors(posts).await
    }

    /// Every post by `author_id`, newest first. Unknown authors yield an
    /// empty list.
    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<PostWithAuthor>, PostError> {
        let posts = self.store.list_by_author(author_id).await?;
        self.with_authors(posts).await
    }

    pub async fn get_by_id(&self, post_id: Uuid) -> Result<PostWithAuthor, PostError> {
        let post = self.store.get(post_id).await?.ok_or(PostError::NotFound)?;

        self.with_authors(vec![post])
            .await?
            .pop()
            .ok_or(PostError::NotFound)
    }

    pub async fn create(&self, caller: Caller, content: &str) -> Result<Post, PostError> {
        let content = validate_content(content)?;

        if !self.limiter.check(&caller.id) {
            warn!(caller = %caller.id, "post creation rate limited");
            return Err(PostError::RateLimited);
        }

        let post = self
            .store
            .insert(Post {
                id: Uuid::new_v4(),
                author_id: caller.id,
                content: content.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        info!("Post created: {} by user {}", post.id, caller.id);

        Ok(post)
    }

    async fn with_authors(&self, posts: Vec<Post>) -> Result<Vec<PostWithAuthor>, PostError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let author_ids: Vec<Uuid> = posts
            .iter()
            .map(|post| post.author_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let authors = self.directory.get_many_by_id(&author_ids).await?;

        posts
            .into_iter()
            .map(|post| match authors.get(&post.author_id) {
                Some(author) => Ok(PostWithAuthor {
                    author: author.clone(),
                    post,
                }),
                None => {
                    error!(
                        post_id = %post.id,
                        author_id = %post.author_id,
                        "author for post not found"
                    );
                    Err(PostError::InternalConsistency(
                        "author for post not found".into(),
                    ))
                }
            })
            .collect()
    }
}

/// Trims surrounding whitespace and enforces 1..=280 characters.
pub fn validate_content(content: &str) -> Result<&str, PostError> {
    let trimmed = content.trim();
    let chars = trimmed.chars().count();

    if chars == 0 {
        return Err(PostError::Validation("Post cannot be empty".into()));
    }
    if chars > MAX_POST_CHARS {
        return Err(PostError::Validation(format!(
            "Post must be at most {MAX_POST_CHARS} characters"
        )));
    }

    Ok(trimmed)
}
