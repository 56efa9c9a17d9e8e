//! credgate Core - Identity model, credential store, and shared configuration
//!
//! This crate defines the pieces every credgate binary shares:
//! - The `Identity` record and its public projection
//! - The `CredentialStore` trait and its PostgreSQL and in-memory backends
//! - Configuration management

pub mod config;
pub mod memory;
pub mod postgres;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;
pub use store::{CredentialStore, StoreError, StoreResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Identity
// ============================================================================

/// A persisted user identity
///
/// Rows are append-only: the store assigns `id` and `created_at` on insert and
/// nothing in credgate ever updates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Identity {
    /// Store-assigned identifier, always positive
    pub id: i64,
    /// Unique, case-sensitive login name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Self-describing password hash (PHC or legacy bcrypt format)
    #[sqlx(rename = "hashed_password")]
    pub password_hash: String,
    /// Creation timestamp, set once by the store
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Project the identity onto the fields that may leave the service
    pub fn to_info(&self) -> IdentityInfo {
        IdentityInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public identity representation
///
/// This is the only identity shape returned across the transport boundary;
/// the password hash never appears in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<Identity> for IdentityInfo {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            email: identity.email,
        }
    }
}

/// Row data for a new identity, before the store assigns `id` and `created_at`
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewIdentity {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}
