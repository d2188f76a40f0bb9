//! In-memory store fakes for the integration suite.
//!
//! Each fake guards its map with a single mutex, which is exactly the
//! per-identity atomicity the store contracts promise: the fingerprint
//! compare-and-swap happens under one lock acquisition.

use async_trait::async_trait;
use chrono::Utc;
use identity_core::error::{AuthError, Result};
use identity_core::models::Identity;
use identity_core::store::{IdentityStore, RevocationStore};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: Mutex<HashMap<Uuid, Identity>>,
}

impl MemoryIdentityStore {
    pub async fn get(&self, id: Uuid) -> Option<Identity> {
        self.identities.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Identity> {
        let mut identities = self.identities.lock().await;
        if identities.values().any(|i| i.email == email) {
            return Err(AuthError::AccountExists);
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            confirmed: false,
            refresh_fingerprint: None,
            created_at: now,
            updated_at: now,
        };
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let identities = self.identities.lock().await;
        Ok(identities.values().find(|i| i.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.identities.lock().await.get(&id).cloned())
    }

    async fn update_fingerprint(&self, id: Uuid, fingerprint: Option<&str>) -> Result<()> {
        let mut identities = self.identities.lock().await;
        if let Some(identity) = identities.get_mut(&id) {
            identity.refresh_fingerprint = fingerprint.map(str::to_string);
            identity.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn swap_fingerprint(&self, id: Uuid, expected: &str, replacement: &str) -> Result<bool> {
        let mut identities = self.identities.lock().await;
        match identities.get_mut(&id) {
            Some(identity) if identity.refresh_fingerprint.as_deref() == Some(expected) => {
                identity.refresh_fingerprint = Some(replacement.to_string());
                identity.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_confirmed(&self, id: Uuid) -> Result<bool> {
        let mut identities = self.identities.lock().await;
        match identities.get_mut(&id) {
            Some(identity) if !identity.confirmed => {
                identity.confirmed = true;
                identity.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut identities = self.identities.lock().await;
        if let Some(identity) = identities.get_mut(&id) {
            identity.password_hash = password_hash.to_string();
            identity.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRevocationStore {
    keys: Mutex<HashMap<String, Duration>>,
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, key: &str, ttl: Duration) -> Result<()> {
        self.keys.lock().await.insert(key.to_string(), ttl);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.keys.lock().await.contains_key(key))
    }
}

/// Identity store that never answers, for exercising bounded store calls.
pub struct StalledIdentityStore;

impl StalledIdentityStore {
    async fn stall<T>() -> Result<T> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(AuthError::ServiceUnavailable("unreachable".to_string()))
    }
}

#[async_trait]
impl IdentityStore for StalledIdentityStore {
    async fn create(&self, _email: &str, _password_hash: &str) -> Result<Identity> {
        Self::stall().await
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<Identity>> {
        Self::stall().await
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Identity>> {
        Self::stall().await
    }

    async fn update_fingerprint(&self, _id: Uuid, _fingerprint: Option<&str>) -> Result<()> {
        Self::stall().await
    }

    async fn swap_fingerprint(
        &self,
        _id: Uuid,
        _expected: &str,
        _replacement: &str,
    ) -> Result<bool> {
        Self::stall().await
    }

    async fn set_confirmed(&self, _id: Uuid) -> Result<bool> {
        Self::stall().await
    }

    async fn update_password(&self, _id: Uuid, _password_hash: &str) -> Result<()> {
        Self::stall().await
    }
}
