//! External collaborator contracts.
//!
//! The auth core reaches identities, revocation entries and rate windows
//! only through these traits. Production implementations live in
//! [`postgres`] and [`redis`]; tests substitute in-memory fakes. Each store
//! provides its own atomicity — the fingerprint swap and the window
//! increment are single operations on the store side, never read-then-write
//! round trips here.

use crate::error::{AuthError, Result};
use crate::models::identity::Identity;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

pub mod postgres;
pub mod redis;

/// User repository contract.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an unconfirmed identity. A duplicate email fails with
    /// `AccountExists`.
    async fn create(&self, email: &str, password_hash: &str) -> Result<Identity>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>>;

    /// Unconditionally set or clear the stored refresh fingerprint.
    async fn update_fingerprint(&self, id: Uuid, fingerprint: Option<&str>) -> Result<()>;

    /// Atomically replace `expected` with `replacement`.
    ///
    /// Returns `false` when the stored fingerprint no longer matches
    /// `expected` — the caller lost a rotation race or the chain was torn
    /// down, and must not treat its token as live.
    async fn swap_fingerprint(&self, id: Uuid, expected: &str, replacement: &str) -> Result<bool>;

    /// Set the confirmed flag. Returns `false` when it was already set, so
    /// exactly one of two racing confirmations wins.
    async fn set_confirmed(&self, id: Uuid) -> Result<bool>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
}

/// Fast key-value store recording invalidated token ids until their natural
/// expiry. Entries carry a TTL equal to the source token's remaining
/// lifetime, so storage stays bounded without cleanup jobs.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn put(&self, key: &str, ttl: Duration) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;
}

/// One observation of a rate window, taken as part of the increment.
#[derive(Debug, Clone, Copy)]
pub struct WindowSample {
    /// Requests seen in the current window, including this one.
    pub count: u64,
    /// Time until the window elapses.
    pub remaining: Duration,
}

/// Counter cache backing the rate limiter gate. Window state is ephemeral:
/// a cache restart resets every counter, which the gate accepts (fail-open
/// on counter loss).
#[async_trait]
pub trait RateLimitCache: Send + Sync {
    /// Atomically increment the counter for `key`, opening a window of
    /// `window` on the key's first request.
    async fn increment(&self, key: &str, window: Duration) -> Result<WindowSample>;
}

/// Bound an external-store call.
///
/// An elapsed timer surfaces as `ServiceUnavailable` so callers can tell
/// "undetermined" from "denied"; no store call may block a request
/// indefinitely.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::ServiceUnavailable(
            "store call timed out".to_string(),
        )),
    }
}
