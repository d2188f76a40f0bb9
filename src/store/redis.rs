//! Redis-backed revocation store and rate-limit cache.
//!
//! Revocation keys expire with the tokens they shadow (`SET ... EX`), so the
//! blacklist never needs a cleanup pass. Rate windows are plain counters
//! whose TTL is the window duration; losing the cache resets every window.

use crate::config::RedisSettings;
use crate::error::Result;
use crate::store::{RateLimitCache, RevocationStore, WindowSample};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

const REVOKED_PREFIX: &str = "identity:revoked:";
const RATE_PREFIX: &str = "identity:ratelimit:";

/// Open a managed connection; the manager reconnects on its own.
pub async fn connect(settings: &RedisSettings) -> Result<ConnectionManager> {
    let client = redis::Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;

    Ok(manager)
}

#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(format!("{REVOKED_PREFIX}{key}"))
            .arg("1")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(format!("{REVOKED_PREFIX}{key}"))
            .query_async(&mut conn)
            .await?;

        Ok(exists)
    }
}

#[derive(Clone)]
pub struct RedisRateLimitCache {
    conn: ConnectionManager,
}

impl RedisRateLimitCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RateLimitCache for RedisRateLimitCache {
    async fn increment(&self, key: &str, window: Duration) -> Result<WindowSample> {
        let full_key = format!("{RATE_PREFIX}{key}");
        let mut conn = self.conn.clone();

        let count: u64 = redis::cmd("INCR")
            .arg(&full_key)
            .query_async(&mut conn)
            .await?;

        // The first request opens the window
        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(&full_key)
                .arg(window.as_secs())
                .query_async::<_, ()>(&mut conn)
                .await?;

            return Ok(WindowSample {
                count,
                remaining: window,
            });
        }

        let ttl_ms: i64 = redis::cmd("PTTL")
            .arg(&full_key)
            .query_async(&mut conn)
            .await?;

        // PTTL < 0 means the key lost its expiry (counter loss in disguise);
        // report a full window rather than a stuck one
        let remaining = if ttl_ms > 0 {
            Duration::from_millis(ttl_ms as u64)
        } else {
            window
        };

        Ok(WindowSample { count, remaining })
    }
}
