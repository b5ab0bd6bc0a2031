use crate::{
    config::Config,
    identity::{IdentityProvider, IdentitySettings},
    rate_limit::{KeyedRateLimiter, RateLimit, Unlimited, spawn_pruner},
    service::PostService,
    store::InMemoryPostStore,
};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::warn;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Cloned into every handler. Everything inside is behind an `Arc`, so a
/// clone is a handful of refcount bumps.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityProvider>,
    pub posts: PostService,
    limiter: Option<Arc<KeyedRateLimiter>>,
    prune_every: Duration,
}

impl AppState {
    /// Wires the in-memory store, identity provider and limiter from config.
    pub fn from_config(config: &Config) -> Self {
        let identity = Arc::new(IdentityProvider::new(IdentitySettings {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: config.token_ttl,
            bcrypt_cost: config.bcrypt_cost,
            default_avatar_url: config.default_avatar_url.clone(),
        }));

        let keyed = if config.rate_limit_enabled {
            let limiter = KeyedRateLimiter::new(config.post_rate_limit, config.post_rate_window);
            if limiter.is_none() {
                warn!("Post rate limit has a zero bound, running without a limit");
            }
            limiter.map(Arc::new)
        } else {
            None
        };

        let limiter: Arc<dyn RateLimit> = match &keyed {
            Some(keyed) => keyed.clone(),
            None => Arc::new(Unlimited),
        };

        let posts = PostService::new(
            Arc::new(InMemoryPostStore::new()),
            identity.clone(),
            limiter,
            config.feed_limit,
        );

        Self {
            identity,
            posts,
            limiter: keyed,
            prune_every: config.post_rate_window,
        }
    }

    /// Starts the background task that evicts idle rate-limit buckets, once
    /// per quota window. `None` when rate limiting is off.
    pub fn spawn_limiter_pruning(&self) -> Option<JoinHandle<()>> {
        self.limiter
            .as_ref()
            .map(|limiter| spawn_pruner(Arc::clone(limiter), self.prune_every))
    }

    pub fn tracked_rate_limit_callers(&self) -> usize {
        self.limiter
            .as_ref()
            .map_or(0, |limiter| limiter.tracked_callers())
    }
}
