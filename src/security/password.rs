/// Password hashing and verification using Argon2id
use crate::error::{AuthError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id.
///
/// Output is a PHC-formatted string carrying the salt and cost parameters,
/// so verification is self-contained. The raw password is never stored or
/// logged.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let digest = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::ServiceUnavailable(format!("password hashing failed: {e}")))?
        .to_string();

    Ok(digest)
}

/// Verify a password against its stored digest.
///
/// Returns `false` on a mismatch or a malformed digest — verification never
/// errors, so callers cannot tell the two apart through the error type.
/// Comparison inside the argon2 crate is constant-time.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let digest = hash_password("correct horse battery staple").expect("should hash");
        assert!(verify_password("correct horse battery staple", &digest));
    }

    #[test]
    fn wrong_password_fails() {
        let digest = hash_password("correct horse battery staple").expect("should hash");
        assert!(!verify_password("incorrect horse", &digest));
    }

    #[test]
    fn malformed_digest_fails_closed() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("hunter2hunter2").expect("should hash");
        let second = hash_password("hunter2hunter2").expect("should hash");
        // Per-password random salts
        assert_ne!(first, second);
    }
}
