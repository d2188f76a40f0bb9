use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Purpose tag carried by every token.
///
/// Decoding rejects unrecognized tags outright, and each operation accepts
/// exactly one purpose — an access token presented where a refresh token is
/// expected fails the same way a forged token does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenPurpose {
    Access,
    Refresh,
    EmailConfirm,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::Refresh => "refresh",
            TokenPurpose::EmailConfirm => "email-confirm",
            TokenPurpose::PasswordReset => "password-reset",
        }
    }
}

/// Signed token claims. Immutable once issued; validity is derived from
/// signature and expiry, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity id (UUID string).
    pub sub: String,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
    /// Session id: the `jti` of the refresh token this token was issued
    /// alongside. Set on access tokens so sensitive endpoints can screen
    /// them against the revocation store after a logout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub purpose: TokenPurpose,
}

impl Claims {
    /// Subject as an identity id; `None` when the claim is not a UUID.
    pub fn subject_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Time until this token's natural expiry; zero when already expired.
    /// Revocation entries use this so their storage stays bounded.
    pub fn remaining_ttl(&self) -> Duration {
        let secs = self.exp - Utc::now().timestamp();
        if secs > 0 {
            Duration::from_secs(secs as u64)
        } else {
            Duration::ZERO
        }
    }
}

/// A freshly issued token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Access + refresh pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}
