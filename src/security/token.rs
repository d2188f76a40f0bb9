//! Signed token codec.
//!
//! Issues and verifies the three credential kinds the core deals in —
//! access, refresh and email-confirmation tokens (plus password-reset, which
//! rides the same machinery). Tokens are HS256 JWTs signed with the current
//! process-wide secret; verification additionally accepts the ordered list
//! of previous secrets so secrets rotate without invalidating tokens in
//! flight. Newly issued tokens always use the current secret.

use crate::config::TokenSettings;
use crate::error::{AuthError, Result};
use crate::models::token::{Claims, IssuedToken, TokenPair, TokenPurpose};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Stateless codec built once at startup from [`TokenSettings`].
///
/// All operations are pure; the codec holds no mutable state and needs no
/// locking.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: Vec<DecodingKey>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    email_confirm_ttl: Duration,
    password_reset_ttl: Duration,
}

impl TokenCodec {
    pub fn new(settings: &TokenSettings) -> Self {
        let mut decoding = vec![DecodingKey::from_secret(settings.secret.as_bytes())];
        decoding.extend(
            settings
                .previous_secrets
                .iter()
                .map(|secret| DecodingKey::from_secret(secret.as_bytes())),
        );

        Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding,
            access_ttl: Duration::seconds(settings.access_ttl_secs as i64),
            refresh_ttl: Duration::seconds(settings.refresh_ttl_secs as i64),
            email_confirm_ttl: Duration::seconds(settings.email_confirm_ttl_secs as i64),
            password_reset_ttl: Duration::seconds(settings.password_reset_ttl_secs as i64),
        }
    }

    fn ttl(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::Access => self.access_ttl,
            TokenPurpose::Refresh => self.refresh_ttl,
            TokenPurpose::EmailConfirm => self.email_confirm_ttl,
            TokenPurpose::PasswordReset => self.password_reset_ttl,
        }
    }

    /// Issue a token for `subject` with a fresh unique id.
    ///
    /// TTLs are fixed per purpose from configuration, never caller-supplied.
    pub fn issue(
        &self,
        subject: Uuid,
        purpose: TokenPurpose,
        session: Option<String>,
    ) -> Result<IssuedToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl(purpose)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            sid: session,
            purpose,
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AuthError::ServiceUnavailable(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, claims })
    }

    /// Issue an access + refresh pair.
    ///
    /// The access token carries the refresh token's `jti` as its session id,
    /// tying the pair together for revocation checks at sensitive endpoints.
    pub fn issue_pair(&self, subject: Uuid) -> Result<TokenPair> {
        let refresh = self.issue(subject, TokenPurpose::Refresh, None)?;
        let access = self.issue(subject, TokenPurpose::Access, Some(refresh.claims.jti.clone()))?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Decode and verify a token against the secret rotation set.
    ///
    /// Fails closed: signature, expiry (zero leeway), structure and purpose
    /// failures all collapse into `InvalidToken`.
    pub fn decode(&self, raw: &str) -> Result<Claims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        for key in &self.decoding {
            if let Ok(data) = decode::<Claims>(raw, key, &validation) {
                return Ok(data.claims);
            }
        }

        Err(AuthError::InvalidToken)
    }

    /// Decode, requiring a specific purpose tag.
    pub fn decode_expecting(&self, raw: &str, purpose: TokenPurpose) -> Result<Claims> {
        let claims = self.decode(raw)?;
        if claims.purpose != purpose {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Stable fingerprint of an encoded token (SHA-256, hex).
///
/// Stored in place of the token itself so a database dump never leaks a
/// usable credential.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
