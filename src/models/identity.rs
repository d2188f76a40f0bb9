use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identity as seen by the auth core.
///
/// The owning user repository carries more columns (profile, avatar, contact
/// book); this projection is limited to what authentication reads, and the
/// core writes only `confirmed`, `refresh_fingerprint` and `password_hash`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// PHC-formatted Argon2id digest; never the raw password.
    pub password_hash: String,
    pub confirmed: bool,
    /// SHA-256 fingerprint of the currently valid refresh token, or `None`
    /// when no session is active.
    pub refresh_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// True while a refresh chain is active for this identity.
    pub fn has_active_session(&self) -> bool {
        self.refresh_fingerprint.is_some()
    }
}
