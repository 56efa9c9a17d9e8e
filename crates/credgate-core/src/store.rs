//! Credential store abstraction
//!
//! The store is the only writer of identity rows. Callers depend on the trait
//! and never see how connections are acquired or released.

use async_trait::async_trait;
use thiserror::Error;

use crate::{Identity, NewIdentity};

/// Credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's uniqueness constraint rejected the row
    #[error("Username or email already exists")]
    ConstraintViolation,

    /// Store unavailable or the statement failed for another reason
    #[error("Database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable table of identities
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an identity by exact, case-sensitive username
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>>;

    /// Check whether any identity already uses this username or this email
    async fn exists(&self, username: &str, email: &str) -> StoreResult<bool>;

    /// Insert a new identity
    ///
    /// Returns `StoreError::ConstraintViolation` when a concurrent insert won
    /// the race on the username or email uniqueness constraint.
    async fn insert(&self, identity: NewIdentity) -> StoreResult<Identity>;
}
