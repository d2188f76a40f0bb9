//! Configuration management for the auth core.
//!
//! Settings load once at process startup from environment variables, with a
//! `.env` file honored in debug builds. Signing secrets live here and only
//! here: the token codec is built from an immutable snapshot of these
//! settings, and key rotation is the ordered `previous_secrets` list rather
//! than reassignment at runtime.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub tokens: TokenSettings,
    pub rate_limit: RateLimitSettings,
    pub timeouts: TimeoutSettings,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            tokens: TokenSettings::from_env()?,
            rate_limit: RateLimitSettings::from_env()?,
            timeouts: TimeoutSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout_secs: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Redis cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
        })
    }
}

/// Token signing and lifetime settings.
///
/// `secret` signs every newly issued token; `previous_secrets` are still
/// accepted for verification so secrets can be rotated without invalidating
/// tokens in flight. TTLs are per-purpose and never caller-supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    pub secret: String,
    pub previous_secrets: Vec<String>,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub email_confirm_ttl_secs: u64,
    pub password_reset_ttl_secs: u64,
}

impl TokenSettings {
    fn from_env() -> Result<Self> {
        let previous_secrets = env::var("AUTH_TOKEN_PREVIOUS_SECRETS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            secret: env::var("AUTH_TOKEN_SECRET").context("AUTH_TOKEN_SECRET must be set")?,
            previous_secrets,
            access_ttl_secs: env::var("AUTH_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("Invalid AUTH_ACCESS_TTL_SECS")?,
            refresh_ttl_secs: env::var("AUTH_REFRESH_TTL_SECS")
                .unwrap_or_else(|_| "604800".to_string())
                .parse()
                .context("Invalid AUTH_REFRESH_TTL_SECS")?,
            email_confirm_ttl_secs: env::var("AUTH_EMAIL_CONFIRM_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid AUTH_EMAIL_CONFIRM_TTL_SECS")?,
            password_reset_ttl_secs: env::var("AUTH_PASSWORD_RESET_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid AUTH_PASSWORD_RESET_TTL_SECS")?,
        })
    }
}

/// Default budget for rate-limited routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid RATE_LIMIT_MAX_REQUESTS")?,
            window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid RATE_LIMIT_WINDOW_SECS")?,
        })
    }
}

/// Bounds applied to every external-store call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    pub store_call_ms: u64,
}

impl TimeoutSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            store_call_ms: env::var("STORE_CALL_TIMEOUT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .context("Invalid STORE_CALL_TIMEOUT_MS")?,
        })
    }

    pub fn store_call(&self) -> Duration {
        Duration::from_millis(self.store_call_ms)
    }
}
