//! Session manager: the refresh-chain state machine per identity.
//!
//! `NoSession → Active(fp) → Active(fp') on refresh → Revoked on logout`
//!
//! The stored fingerprint identifies the single valid refresh token for an
//! identity. Login overwrites it — revoking any chain issued earlier —
//! refresh rotates it with an atomic compare-and-swap, and logout clears it
//! and records a revocation entry. Every operation commits its effects
//! before returning, so a lost response never desynchronizes stored state
//! from issued tokens.

use crate::error::{AuthError, Result};
use crate::models::identity::Identity;
use crate::models::token::{Claims, IssuedToken, TokenPair, TokenPurpose};
use crate::security::password::{hash_password, verify_password};
use crate::security::token::{fingerprint, TokenCodec};
use crate::store::{bounded, IdentityStore, RevocationStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct SessionManager {
    identities: Arc<dyn IdentityStore>,
    revocations: Arc<dyn RevocationStore>,
    codec: TokenCodec,
    store_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        revocations: Arc<dyn RevocationStore>,
        codec: TokenCodec,
        store_timeout: Duration,
    ) -> Self {
        Self {
            identities,
            revocations,
            codec,
            store_timeout,
        }
    }

    /// Create an unconfirmed identity from an email and password.
    ///
    /// The caller follows up with [`Self::issue_confirmation`] and hands the
    /// token to the email transport; delivery failures there do not undo
    /// the registration.
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity> {
        let digest = hash_password(password)?;
        let identity = bounded(self.store_timeout, self.identities.create(email, &digest)).await?;

        info!(user_id = %identity.id, "Identity registered");
        Ok(identity)
    }

    /// Authenticate with email and password, opening a new refresh chain.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let identity = bounded(self.store_timeout, self.identities.find_by_email(email))
            .await?
            // Unknown email reads exactly like a wrong password
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &identity.password_hash) {
            debug!(user_id = %identity.id, "Password verification failed");
            return Err(AuthError::InvalidCredentials);
        }

        if !identity.confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        let pair = self.codec.issue_pair(identity.id)?;
        let fp = fingerprint(&pair.refresh_token);

        // Overwriting the fingerprint revokes any earlier refresh chain
        bounded(
            self.store_timeout,
            self.identities.update_fingerprint(identity.id, Some(&fp)),
        )
        .await?;

        info!(user_id = %identity.id, "Login succeeded");
        Ok(pair)
    }

    /// Exchange a live refresh token for a new access + refresh pair.
    ///
    /// Rotation-on-use: the presented token's fingerprint is swapped out
    /// atomically, so of N concurrent calls with the same token exactly one
    /// succeeds and the rest observe `RevokedToken`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self
            .codec
            .decode_expecting(refresh_token, TokenPurpose::Refresh)?;
        let subject = claims.subject_id().ok_or(AuthError::InvalidToken)?;

        let identity = bounded(self.store_timeout, self.identities.find_by_id(subject))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let presented = fingerprint(refresh_token);
        match identity.refresh_fingerprint.as_deref() {
            Some(current) if current == presented => {}
            _ => {
                warn!(user_id = %identity.id, "Refresh token is not the active chain");
                return Err(AuthError::RevokedToken);
            }
        }

        let pair = self.codec.issue_pair(identity.id)?;
        let replacement = fingerprint(&pair.refresh_token);

        let rotated = bounded(
            self.store_timeout,
            self.identities
                .swap_fingerprint(identity.id, &presented, &replacement),
        )
        .await?;
        if !rotated {
            // A concurrent refresh won the swap; this caller's token is spent
            warn!(user_id = %identity.id, "Lost refresh rotation race");
            return Err(AuthError::RevokedToken);
        }

        self.revoke_token_id(&claims).await?;

        info!(user_id = %identity.id, "Refresh chain rotated");
        Ok(pair)
    }

    /// Tear down the refresh chain for the presented token's identity.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let claims = self
            .codec
            .decode_expecting(refresh_token, TokenPurpose::Refresh)?;
        let subject = claims.subject_id().ok_or(AuthError::InvalidToken)?;

        bounded(
            self.store_timeout,
            self.identities.update_fingerprint(subject, None),
        )
        .await?;
        self.revoke_token_id(&claims).await?;

        info!(user_id = %subject, "Logged out");
        Ok(())
    }

    /// Consume an email-confirmation token.
    ///
    /// Single-use: once the flag is set, replay fails with
    /// `AlreadyConfirmed` — a distinct kind so callers can observe replays
    /// while still treating them as success-equivalent.
    pub async fn confirm_email(&self, confirm_token: &str) -> Result<()> {
        let claims = self
            .codec
            .decode_expecting(confirm_token, TokenPurpose::EmailConfirm)?;
        let subject = claims.subject_id().ok_or(AuthError::InvalidToken)?;

        let identity = bounded(self.store_timeout, self.identities.find_by_id(subject))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if identity.confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }

        let updated = bounded(self.store_timeout, self.identities.set_confirmed(subject)).await?;
        if !updated {
            // A concurrent confirmation landed first
            return Err(AuthError::AlreadyConfirmed);
        }

        info!(user_id = %subject, "Email confirmed");
        Ok(())
    }

    /// Mint a confirmation token for the external email transport.
    pub fn issue_confirmation(&self, identity: &Identity) -> Result<IssuedToken> {
        self.codec
            .issue(identity.id, TokenPurpose::EmailConfirm, None)
    }

    /// Mint a password-reset token for the external email transport.
    pub fn issue_password_reset(&self, identity: &Identity) -> Result<IssuedToken> {
        self.codec
            .issue(identity.id, TokenPurpose::PasswordReset, None)
    }

    /// Consume a password-reset token and install a new password.
    ///
    /// The token is single-use, and a successful reset clears the refresh
    /// chain so every active session must authenticate again.
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<()> {
        let claims = self
            .codec
            .decode_expecting(reset_token, TokenPurpose::PasswordReset)?;
        let subject = claims.subject_id().ok_or(AuthError::InvalidToken)?;

        let consumed = bounded(self.store_timeout, self.revocations.exists(&claims.jti)).await?;
        if consumed {
            return Err(AuthError::InvalidToken);
        }

        let identity = bounded(self.store_timeout, self.identities.find_by_id(subject))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let digest = hash_password(new_password)?;
        bounded(
            self.store_timeout,
            self.identities.update_password(identity.id, &digest),
        )
        .await?;
        bounded(
            self.store_timeout,
            self.identities.update_fingerprint(identity.id, None),
        )
        .await?;
        self.revoke_token_id(&claims).await?;

        info!(user_id = %identity.id, "Password reset completed");
        Ok(())
    }

    /// Stateless access check: signature, expiry and purpose only.
    ///
    /// No store round trip — revocation is enforced at the refresh and
    /// logout boundaries instead.
    pub fn verify_access(&self, access_token: &str) -> Result<Claims> {
        self.codec
            .decode_expecting(access_token, TokenPurpose::Access)
    }

    /// Access check for sensitive endpoints: additionally rejects tokens
    /// whose session was ended by a logout or rotation.
    pub async fn verify_access_strict(&self, access_token: &str) -> Result<Claims> {
        let claims = self.verify_access(access_token)?;

        if let Some(sid) = claims.sid.as_deref() {
            if bounded(self.store_timeout, self.revocations.exists(sid)).await? {
                return Err(AuthError::RevokedToken);
            }
        }

        Ok(claims)
    }

    /// Record a consumed token id until the token's natural expiry.
    async fn revoke_token_id(&self, claims: &Claims) -> Result<()> {
        let remaining = claims.remaining_ttl();
        if remaining.is_zero() {
            return Ok(());
        }

        bounded(
            self.store_timeout,
            self.revocations.put(&claims.jti, remaining),
        )
        .await
    }
}
