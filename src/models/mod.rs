pub mod identity;
pub mod token;

// Re-export commonly used types
pub use identity::Identity;
pub use token::{Claims, IssuedToken, TokenPair, TokenPurpose};
