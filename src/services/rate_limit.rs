//! Rate limiter gate: fixed request windows per (caller, route).
//!
//! Counters live in the external cache with TTL = window duration. The
//! state is deliberately ephemeral — a cache restart resets every window,
//! trading strictness on counter loss for availability. In-flight cache
//! failures are NOT swallowed here; they surface as `ServiceUnavailable`
//! so the routing layer can pick its own policy.

use crate::error::{AuthError, Result};
use crate::store::{bounded, RateLimitCache, WindowSample};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Per-route request budget.
#[derive(Debug, Clone, Copy)]
pub struct RouteLimit {
    pub max: u32,
    pub window: Duration,
}

/// Caller half of a rate key: the authenticated identity when there is one,
/// the peer address otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSubject {
    Identity(Uuid),
    Ip(IpAddr),
}

impl fmt::Display for RateSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSubject::Identity(id) => write!(f, "user:{id}"),
            RateSubject::Ip(addr) => write!(f, "ip:{addr}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    Deny { retry_after: Duration },
}

pub struct RateLimiterGate {
    cache: Arc<dyn RateLimitCache>,
    call_timeout: Duration,
}

impl RateLimiterGate {
    pub fn new(cache: Arc<dyn RateLimitCache>, call_timeout: Duration) -> Self {
        Self {
            cache,
            call_timeout,
        }
    }

    /// Count this request against `(subject, route)` and decide.
    ///
    /// The first request for a key opens a window; once the count exceeds
    /// `limit.max`, callers are denied until the window elapses, with
    /// `retry_after` = remaining window.
    pub async fn check(
        &self,
        subject: RateSubject,
        route: &str,
        limit: RouteLimit,
    ) -> Result<RateDecision> {
        let key = format!("{subject}:{route}");
        let WindowSample { count, remaining } =
            bounded(self.call_timeout, self.cache.increment(&key, limit.window)).await?;

        if count > u64::from(limit.max) {
            let retry_after = remaining.min(limit.window);
            warn!(%subject, route, count, "Rate limit exceeded");
            return Ok(RateDecision::Deny { retry_after });
        }

        Ok(RateDecision::Allow)
    }

    /// [`Self::check`], folded into the error taxonomy for callers that
    /// prefer `?`.
    pub async fn enforce(
        &self,
        subject: RateSubject,
        route: &str,
        limit: RouteLimit,
    ) -> Result<()> {
        match self.check(subject, route, limit).await? {
            RateDecision::Allow => Ok(()),
            RateDecision::Deny { retry_after } => Err(AuthError::RateLimited { retry_after }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory cache whose windows expire only when the test advances
    /// time explicitly.
    #[derive(Default)]
    struct FakeCache {
        windows: Mutex<HashMap<String, (u64, Duration)>>,
    }

    impl FakeCache {
        async fn advance(&self, by: Duration) {
            let mut windows = self.windows.lock().await;
            windows.retain(|_, (_, remaining)| {
                if *remaining <= by {
                    return false;
                }
                *remaining -= by;
                true
            });
        }
    }

    #[async_trait]
    impl RateLimitCache for FakeCache {
        async fn increment(&self, key: &str, window: Duration) -> Result<WindowSample> {
            let mut windows = self.windows.lock().await;
            let entry = windows.entry(key.to_string()).or_insert((0, window));
            entry.0 += 1;
            Ok(WindowSample {
                count: entry.0,
                remaining: entry.1,
            })
        }
    }

    fn limit() -> RouteLimit {
        RouteLimit {
            max: 5,
            window: Duration::from_secs(60),
        }
    }

    fn subject() -> RateSubject {
        RateSubject::Ip("203.0.113.7".parse().unwrap())
    }

    #[tokio::test]
    async fn budget_allows_then_denies() {
        let cache = Arc::new(FakeCache::default());
        let gate = RateLimiterGate::new(cache, Duration::from_secs(1));

        for _ in 0..5 {
            let decision = gate.check(subject(), "login", limit()).await.unwrap();
            assert_eq!(decision, RateDecision::Allow);
        }

        match gate.check(subject(), "login", limit()).await.unwrap() {
            RateDecision::Deny { retry_after } => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::ZERO);
            }
            RateDecision::Allow => panic!("sixth request should be denied"),
        }
    }

    #[tokio::test]
    async fn window_expiry_resets_the_counter() {
        let cache = Arc::new(FakeCache::default());
        let gate = RateLimiterGate::new(cache.clone(), Duration::from_secs(1));

        for _ in 0..6 {
            let _ = gate.check(subject(), "login", limit()).await.unwrap();
        }
        cache.advance(Duration::from_secs(61)).await;

        let decision = gate.check(subject(), "login", limit()).await.unwrap();
        assert_eq!(decision, RateDecision::Allow);
    }

    #[tokio::test]
    async fn keys_are_independent_per_subject_and_route() {
        let cache = Arc::new(FakeCache::default());
        let gate = RateLimiterGate::new(cache, Duration::from_secs(1));

        for _ in 0..6 {
            let _ = gate.check(subject(), "login", limit()).await.unwrap();
        }

        // Other routes and other callers still have budget
        let other_route = gate.check(subject(), "refresh", limit()).await.unwrap();
        assert_eq!(other_route, RateDecision::Allow);

        let other_caller = RateSubject::Identity(Uuid::new_v4());
        let decision = gate.check(other_caller, "login", limit()).await.unwrap();
        assert_eq!(decision, RateDecision::Allow);
    }

    #[tokio::test]
    async fn enforce_maps_deny_into_the_taxonomy() {
        let cache = Arc::new(FakeCache::default());
        let gate = RateLimiterGate::new(cache, Duration::from_secs(1));

        for _ in 0..5 {
            gate.enforce(subject(), "login", limit()).await.unwrap();
        }

        match gate.enforce(subject(), "login", limit()).await {
            Err(AuthError::RateLimited { retry_after }) => {
                assert!(retry_after <= Duration::from_secs(60));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }
}
