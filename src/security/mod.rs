/// Security primitives for the auth core
///
/// - **password**: Argon2id password hashing and verification
/// - **token**: signed, purpose-tagged token codec with secret rotation
pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{fingerprint, TokenCodec};
