/// Authentication & session core for the contacts API
///
/// Provides token issuance and verification, password hashing, the
/// email-confirmation lifecycle, and per-caller rate limiting. The HTTP
/// routing layer, contact persistence, avatar storage and email transport
/// are external collaborators reached through the `store` contracts.
///
/// ## Modules
///
/// - `config`: process-wide settings loaded once at startup
/// - `error`: closed error taxonomy
/// - `models`: identity and token data
/// - `security`: password digests and the signed token codec
/// - `services`: session manager and rate limiter gate
/// - `store`: collaborator contracts plus Postgres/Redis implementations
pub mod config;
pub mod error;
pub mod models;
pub mod security;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use error::{AuthError, Result};
pub use security::token::TokenCodec;
pub use services::rate_limit::{RateDecision, RateLimiterGate, RateSubject, RouteLimit};
pub use services::session::SessionManager;
