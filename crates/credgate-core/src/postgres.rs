//! PostgreSQL credential store
//!
//! Provides the durable `users` table using SQLx and PostgreSQL.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::store::{CredentialStore, StoreError, StoreResult};
use crate::{Identity, NewIdentity};

/// DDL for the users table
///
/// Unique constraints on `username` and `email` are the final authority on
/// duplicates; the pre-insert existence check only catches the common case.
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username VARCHAR(50) UNIQUE NOT NULL,
    email VARCHAR(100) UNIQUE NOT NULL,
    hashed_password VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// PostgreSQL credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store connection pool
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        tracing::info!(pool_size = config.pool_size, "Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// Create the users table if it does not exist yet
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to create users table: {e}")))?;

        tracing::info!("Users table created/verified");
        Ok(())
    }
}

/// Map an insert failure, separating unique violations from everything else
fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::ConstraintViolation
        }
        _ => StoreError::Database(format!("Failed to insert user: {err}")),
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Identity>> {
        let row: Option<Identity> = sqlx::query_as(
            r#"
            SELECT id, username, email, hashed_password, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch user: {e}")))?;

        tracing::debug!(username, found = row.is_some(), "User lookup");
        Ok(row)
    }

    async fn exists(&self, username: &str, email: &str) -> StoreResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE username = $1 OR email = $2 LIMIT 1")
                .bind(username)
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to check existing user: {e}")))?;

        Ok(found.is_some())
    }

    async fn insert(&self, identity: NewIdentity) -> StoreResult<Identity> {
        let row: Identity = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, hashed_password, created_at
            "#,
        )
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        tracing::debug!(id = row.id, username = %row.username, "User inserted");
        Ok(row)
    }
}
