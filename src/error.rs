use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Closed set of failure kinds surfaced by the auth core.
///
/// Every operation resolves to its success payload or to exactly one of
/// these kinds; nothing is caught-and-hidden on the way up, and no retries
/// happen inside the core. The routing layer owns the mapping to
/// transport-level status codes.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are indistinguishable on
    /// purpose so login cannot be used to enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// Any signature, expiry, parse or purpose failure while decoding a
    /// token. A single kind: partial trust is not expressible.
    #[error("invalid token")]
    InvalidToken,

    /// The token was valid once but its session has ended: the refresh
    /// chain rotated past it, or a logout tore it down.
    #[error("token revoked")]
    RevokedToken,

    #[error("email already confirmed")]
    AlreadyConfirmed,

    #[error("account already exists")]
    AccountExists,

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// An external store failed or timed out; the request outcome is
    /// undetermined, as opposed to denied.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

// Conversions from external store error types. Both collapse into
// `ServiceUnavailable`: the caller could not be authenticated or denied,
// only left undetermined.

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AuthError::ServiceUnavailable(err.to_string())
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Redis error: {}", err);
        AuthError::ServiceUnavailable(err.to_string())
    }
}
