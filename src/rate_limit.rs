use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Admission check consulted before every post write.
///
/// `check` consumes quota: a `true` result means the caller has been charged.
pub trait RateLimit: Send + Sync {
    fn check(&self, caller: &Uuid) -> bool;
}

/// In-process limiter keyed by caller id.
///
/// Allows a burst of `max_requests` and refills one slot every
/// `window / max_requests`, so a caller that drains the bucket gets the full
/// quota back once `window` has elapsed.
pub struct KeyedRateLimiter {
    limiter: DefaultKeyedRateLimiter<Uuid>,
}

impl KeyedRateLimiter {
    /// Returns `None` when either bound is zero.
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(max_requests)?;
        let quota = Quota::with_period(window / max_requests)?.allow_burst(burst);

        Some(Self {
            limiter: RateLimiter::keyed(quota),
        })
    }

    /// Drops buckets that are full again. Callers that come back start fresh.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_callers(&self) -> usize {
        self.limiter.len()
    }
}

/// Prunes `limiter` every `every` until the returned task is aborted.
pub fn spawn_pruner(limiter: Arc<KeyedRateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let before = limiter.tracked_callers();
            limiter.prune();
            debug!(
                before,
                after = limiter.tracked_callers(),
                "pruned rate limit buckets"
            );
        }
    })
}

impl RateLimit for KeyedRateLimiter {
    fn check(&self, caller: &Uuid) -> bool {
        match self.limiter.check_key(caller) {
            Ok(()) => true,
            Err(_) => {
                debug!(caller = %caller, "post quota exhausted");
                false
            }
        }
    }
}

/// Admits everything. Used when rate limiting is switched off.
pub struct Unlimited;

impl RateLimit for Unlimited {
    fn check(&self, _caller: &Uuid) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bounds_are_rejected() {
        assert!(KeyedRateLimiter::new(0, Duration::from_secs(60)).is_none());
        assert!(KeyedRateLimiter::new(3, Duration::ZERO).is_none());
    }

    #[test]
    fn quota_plus_one_is_denied() {
        let limiter = KeyedRateLimiter::new(3, Duration::from_secs(60)).unwrap();
        let caller = Uuid::new_v4();

        assert!(limiter.check(&caller));
        assert!(limiter.check(&caller));
        assert!(limiter.check(&caller));
        assert!(!limiter.check(&caller));
    }

    #[test]
    fn callers_do_not_share_quota() {
        let limiter = KeyedRateLimiter::new(1, Duration::from_secs(60)).unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(limiter.check(&alice));
        assert!(!limiter.check(&alice));
        assert!(limiter.check(&bob));
        assert_eq!(limiter.tracked_callers(), 2);
    }

    #[tokio::test]
    async fn quota_returns_after_window() {
        let limiter = KeyedRateLimiter::new(2, Duration::from_millis(200)).unwrap();
        let caller = Uuid::new_v4();

        assert!(limiter.check(&caller));
        assert!(limiter.check(&caller));
        assert!(!limiter.check(&caller));

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(limiter.check(&caller));
        assert!(limiter.check(&caller));
    }

    #[tokio::test]
    async fn prune_forgets_refilled_callers() {
        let limiter = KeyedRateLimiter::new(1, Duration::from_millis(50)).unwrap();
        limiter.check(&Uuid::new_v4());
        assert_eq!(limiter.tracked_callers(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        limiter.prune();

        assert_eq!(limiter.tracked_callers(), 0);
    }

    #[tokio::test]
    async fn pruner_task_bounds_tracked_callers() {
        let limiter = Arc::new(KeyedRateLimiter::new(1, Duration::from_millis(30)).unwrap());
        for _ in 0..10_000 {
            limiter.check(&Uuid::new_v4());
        }
        assert_eq!(limiter.tracked_callers(), 10_000);

        let pruner = spawn_pruner(Arc::clone(&limiter), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;

        for _ in 0..10 {
            limiter.check(&Uuid::new_v4());
        }
        assert!(limiter.tracked_callers() <= 10);

        pruner.abort();
    }

    #[test]
    fn concurrent_checks_never_over_admit() {
        let limiter = Arc::new(KeyedRateLimiter::new(3, Duration::from_secs(60)).unwrap());
        let caller = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.check(&caller))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 3);
    }

    #[test]
    fn unlimited_always_admits() {
        let caller = Uuid::new_v4();
        assert!((0..100).all(|_| Unlimited.check(&caller)));
    }
}
