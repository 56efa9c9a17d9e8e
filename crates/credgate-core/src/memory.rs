//! In-memory credential store for development and testing
//!
//! Keeps all identities in a single map behind an async lock. Uniqueness of
//! username and email is enforced at insert time, the same as the database
//! constraints, so race behaviour matches the PostgreSQL store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::store::{CredentialStore, StoreError, StoreResult};
use crate::{Identity, NewIdentity};

#[derive(Default)]
struct Inner {
    by_username: HashMap<String, Identity>,
    next_id: i64,
}

/// In-memory credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_username.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove an identity out of band
    ///
    /// Not part of `CredentialStore`: identities are append-only for the
    /// service. This exists so tests can simulate a row deleted by an operator.
    pub async fn remove(&self, username: &str) -> Option<Identity> {
        self.inner.write().await.by_username.remove(username)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>> {
        Ok(self.inner.read().await.by_username.get(username).cloned())
    }

    async fn exists(&self, username: &str, email: &str) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.by_username.contains_key(username)
            || inner.by_username.values().any(|i| i.email == email))
    }

    async fn insert(&self, identity: NewIdentity) -> StoreResult<Identity> {
        let mut inner = self.inner.write().await;

        if inner.by_username.contains_key(&identity.username)
            || inner.by_username.values().any(|i| i.email == identity.email)
        {
            return Err(StoreError::ConstraintViolation);
        }

        inner.next_id += 1;
        let row = Identity {
            id: inner.next_id,
            username: identity.username,
            email: identity.email,
            password_hash: identity.password_hash,
            created_at: Utc::now(),
        };
        inner.by_username.insert(row.username.clone(), row.clone());

        Ok(row)
    }
}
