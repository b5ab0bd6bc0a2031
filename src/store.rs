use crate::models::Post;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("post {0} already exists")]
    Duplicate(Uuid),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of post rows.
///
/// Listings are newest first. Rows with equal `created_at` come back in
/// reverse insertion order.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: Post) -> Result<Post, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

    async fn list_recent(&self, limit: usize) -> Result<Vec<Post>, StoreError>;

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError>;
}

struct Row {
    seq: u64,
    post: Post,
}

#[derive(Default)]
pub struct InMemoryPostStore {
    rows: DashMap<Uuid, Row>,
    next_seq: AtomicU64,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_sorted<F>(&self, keep: F) -> Vec<(u64, Post)>
    where
        F: Fn(&Post) -> bool,
    {
        let mut posts: Vec<(u64, Post)> = self
            .rows
            .iter()
            .filter(|entry| keep(&entry.post))
            .map(|entry| (entry.seq, entry.post.clone()))
            .collect();

        // Newest first, later insert wins ties
        posts.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_seq.cmp(a_seq))
        });

        posts
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: Post) -> Result<Post, StoreError> {
        use dashmap::mapref::entry::Entry;

        match self.rows.entry(post.id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(post.id)),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(Row {
                    seq,
                    post: post.clone(),
                });
                Ok(post)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.rows.get(&id).map(|row| row.post.clone()))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .collect_sorted(|_| true)
            .into_iter()
            .take(limit)
            .map(|(_, post)| post)
            .collect())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .collect_sorted(|post| post.author_id == author_id)
            .into_iter()
            .map(|(_, post)| post)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn post_at(author_id: Uuid, content: &str, created_at: DateTime<Utc>) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id,
            content: content.to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_capped() {
        let store = InMemoryPostStore::new();
        let author = Uuid::new_v4();
        let base = Utc::now();

        for i in 0..5 {
            store
                .insert(post_at(author, &format!("post {i}"), base + Duration::seconds(i)))
                .await
                .unwrap();
        }

        let recent = store.list_recent(3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["post 4", "post 3", "post 2"]);
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_insertion_order() {
        let store = InMemoryPostStore::new();
        let author = Uuid::new_v4();
        let at = Utc::now();

        store.insert(post_at(author, "first", at)).await.unwrap();
        store.insert(post_at(author, "second", at)).await.unwrap();
        store.insert(post_at(author, "third", at)).await.unwrap();

        let recent = store.list_recent(10).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn by_author_filters_and_is_uncapped() {
        let store = InMemoryPostStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let base = Utc::now();

        for i in 0..4 {
            store
                .insert(post_at(alice, "a", base + Duration::seconds(i)))
                .await
                .unwrap();
        }
        store.insert(post_at(bob, "b", base)).await.unwrap();

        let posts = store.list_by_author(alice).await.unwrap();
        assert_eq!(posts.len(), 4);
        assert!(posts.iter().all(|p| p.author_id == alice));
        assert!(posts.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        assert!(store.list_by_author(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = InMemoryPostStore::new();
        let post = post_at(Uuid::new_v4(), "once", Utc::now());

        store.insert(post.clone()).await.unwrap();
        let err = store.insert(post.clone()).await.unwrap_err();

        assert!(matches!(err, StoreError::Duplicate(id) if id == post.id));
        assert_eq!(store.get(post.id).await.unwrap(), Some(post));
    }
}
