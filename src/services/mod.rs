/// Business logic: session management and rate limiting
pub mod rate_limit;
pub mod session;

pub use rate_limit::{RateDecision, RateLimiterGate, RateSubject, RouteLimit};
pub use session::SessionManager;
