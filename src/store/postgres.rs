/// Postgres-backed identity store
use crate::config::DatabaseSettings;
use crate::error::{AuthError, Result};
use crate::models::identity::Identity;
use crate::store::IdentityStore;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

/// Open a connection pool sized from settings.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&settings.url)
        .await?;

    Ok(pool)
}

pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Identity> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO users (id, email, password_hash, confirmed)
            VALUES ($1, $2, $3, FALSE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                AuthError::AccountExists
            } else {
                AuthError::from(e)
            }
        })?;

        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }

    async fn update_fingerprint(&self, id: Uuid, fingerprint: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_fingerprint = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(fingerprint)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn swap_fingerprint(&self, id: Uuid, expected: &str, replacement: &str) -> Result<bool> {
        // The match on the old fingerprint rides in the WHERE clause, so the
        // compare-and-swap is a single statement; a racing writer observes
        // zero rows affected.
        let result = sqlx::query(
            r#"
            UPDATE users SET refresh_fingerprint = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_fingerprint = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(replacement)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_confirmed(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET confirmed = TRUE, updated_at = NOW() WHERE id = $1 AND confirmed = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
