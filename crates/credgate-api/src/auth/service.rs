//! Authentication service layer
//!
//! Provides the register, login and identify flows. Each flow is a short
//! linear sequence over the credential store, the password hasher and the
//! token service; nothing is cached between calls.

use super::jwt::TokenService;
use super::password::{hash_password_with_config, verify_password, PasswordConfig};
use crate::audit::{audit_log, AuditEvent};
use credgate_core::{CredentialStore, Identity, IdentityInfo, NewIdentity, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use utoipa::ToSchema;
use validator::Validate;

/// Token type reported alongside every access token
pub const TOKEN_TYPE: &str = "bearer";

/// Plaintext behind the hash checked when a login names an unknown user
const DUMMY_PASSWORD: &str = "credgate-dummy-password";

/// Authentication flow errors
///
/// `InvalidCredentials` and `Unauthenticated` carry no detail;
/// the specific cause is written to the audit log only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username or email already registered")]
    DuplicateIdentity,

    #[error("Username or email already registered")]
    ConstraintViolation,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation => AuthError::ConstraintViolation,
            StoreError::Database(msg) => AuthError::Persistence(msg),
        }
    }
}

/// User registration request
///
/// Length limits match the `users.username` and `users.email` columns.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: String,
    #[validate(
        email(message = "email must be a valid address"),
        length(max = 100, message = "email must be at most 100 characters")
    )]
    pub email: String,
    pub password: String,
}

/// User login request (OAuth2 password form fields)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Access token response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the token in seconds
    pub expires_in: u64,
}

/// Authentication service
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    password_config: PasswordConfig,
    /// Hash with the configured cost, verified against for unknown usernames
    dummy_hash: OnceCell<String>,
    verifications: AtomicU64,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        password_config: PasswordConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            password_config,
            dummy_hash: OnceCell::new(),
            verifications: AtomicU64::new(0),
        }
    }

    /// Token service used to sign and validate access tokens
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new identity
    ///
    /// # Returns
    ///
    /// * `Ok(IdentityInfo)` - The stored identity, without its password hash
    /// * `Err(AuthError::DuplicateIdentity)` - Username or email already taken
    /// * `Err(AuthError::ConstraintViolation)` - Lost a concurrent registration race
    /// * `Err(AuthError::Persistence)` - Store unavailable or insert failed
    pub async fn register(&self, request: RegisterRequest) -> Result<IdentityInfo, AuthError> {
        if let Err(e) = request.validate() {
            audit_log(&AuditEvent::RegistrationFailure {
                username: request.username.clone(),
                reason: e.to_string(),
            });
            return Err(AuthError::Validation(e.to_string()));
        }

        if self
            .store
            .exists(&request.username, &request.email)
            .await?
        {
            audit_log(&AuditEvent::RegistrationFailure {
                username: request.username,
                reason: "username or email already exists".to_string(),
            });
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hash(request.password).await?;

        let identity = self
            .store
            .insert(NewIdentity::new(
                request.username.clone(),
                request.email,
                password_hash,
            ))
            .await
            .map_err(|e| {
                audit_log(&AuditEvent::RegistrationFailure {
                    username: request.username.clone(),
                    reason: e.to_string(),
                });
                AuthError::from(e)
            })?;

        audit_log(&AuditEvent::RegistrationSuccess {
            user_id: identity.id,
            username: identity.username.clone(),
        });

        Ok(identity.to_info())
    }

    /// Authenticate a username/password pair and issue an access token
    ///
    /// An unknown username and a wrong password produce the same
    /// `InvalidCredentials` error.
    pub async fn login(&self, request: LoginRequest) -> Result<AccessToken, AuthError> {
        let Some(identity) = self.store.find_by_username(&request.username).await? else {
            // Same Argon2 work as a wrong password, result ignored
            let dummy_hash = self.dummy_hash().await?.to_string();
            self.verify(request.password, dummy_hash).await?;

            audit_log(&AuditEvent::LoginFailure {
                username: request.username,
                reason: "unknown username".to_string(),
            });
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(request.password, identity.password_hash.clone()).await? {
            audit_log(&AuditEvent::LoginFailure {
                username: request.username,
                reason: "password mismatch".to_string(),
            });
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .tokens
            .issue_access_token(&identity.username)
            .map_err(|e| AuthError::Internal(format!("Failed to issue access token: {e}")))?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: identity.id,
            username: identity.username,
        });

        Ok(AccessToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.tokens.access_token_ttl().as_secs(),
        })
    }

    /// Resolve a bearer token to the identity it was issued for
    ///
    /// The identity is re-read from the store on every call, so a row removed
    /// after issuance stops authenticating immediately.
    pub async fn identify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.validate(token).map_err(|e| {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
            });
            AuthError::Unauthenticated
        })?;

        match self.store.find_by_username(&claims.sub).await? {
            Some(identity) => Ok(identity),
            None => {
                audit_log(&AuditEvent::InvalidToken {
                    reason: format!("subject '{}' no longer exists", claims.sub),
                });
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Argon2 runs on the blocking pool, not on an async worker
    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let config = self.password_config.clone();
        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn dummy_hash(&self) -> Result<&str, AuthError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD.to_string()))
            .await
            .map(String::as_str)
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        self.verifications.fetch_add(1, Ordering::Relaxed);
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use credgate_core::MemoryCredentialStore;
    use std::time::Duration;

    fn light_passwords() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    fn service_with(store: Arc<MemoryCredentialStore>) -> AuthService {
        AuthService::new(
            store,
            TokenService::new(&JwtConfig::default()),
            light_passwords(),
        )
    }

    fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_login_identify() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));

        let info = service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();
        assert_eq!(
            info,
            IdentityInfo {
                id: 1,
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
            }
        );

        let token = service
            .login(login_request("alice", "secret123"))
            .await
            .unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 30 * 60);

        let identity = service.identify(&token.access_token).await.unwrap();
        assert_eq!(identity.to_info(), info);
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = service_with(store.clone());

        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();

        let row = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(row.password_hash, "secret123");
        assert!(row.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));

        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();
        let result = service
            .register(register_request("alice", "other@x.com", "secret123"))
            .await;

        assert!(matches!(result, Err(AuthError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));

        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();
        let result = service
            .register(register_request("bob", "a@x.com", "secret123"))
            .await;

        assert!(matches!(result, Err(AuthError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));

        let empty_name = service.register(register_request("", "a@x.com", "pw")).await;
        let long_name = service
            .register(register_request(&"n".repeat(51), "a@x.com", "pw"))
            .await;
        let bad_email = service
            .register(register_request("alice", "not-an-email", "pw"))
            .await;

        assert!(matches!(empty_name, Err(AuthError::Validation(_))));
        assert!(matches!(long_name, Err(AuthError::Validation(_))));
        assert!(matches!(bad_email, Err(AuthError::Validation(_))));

        let max_name = service
            .register(register_request(&"n".repeat(50), "a@x.com", "pw"))
            .await;
        assert!(max_name.is_ok());
    }

    #[tokio::test]
    async fn test_register_email_length_limit() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));
        let email = |label_len: usize| {
            format!(
                "{}@{}.{}.com",
                "u".repeat(30),
                "d".repeat(label_len),
                "e".repeat(32)
            )
        };
        let too_long = email(33);
        let at_limit = email(32);
        assert_eq!(too_long.len(), 101);
        assert_eq!(at_limit.len(), 100);

        let rejected = service
            .register(register_request("alice", &too_long, "pw"))
            .await;
        let accepted = service
            .register(register_request("alice", &at_limit, "pw"))
            .await;

        assert!(matches!(rejected, Err(AuthError::Validation(_))));
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));
        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();

        let wrong_password = service
            .login(login_request("alice", "wrongpass"))
            .await
            .unwrap_err();
        let unknown_user = service.login(login_request("nouser", "x")).await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_unknown_user_runs_password_verification() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));
        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();

        let before = service.verifications.load(Ordering::Relaxed);
        service.login(login_request("alice", "wrongpass")).await.unwrap_err();
        let after_wrong_password = service.verifications.load(Ordering::Relaxed);
        service.login(login_request("nouser", "secret123")).await.unwrap_err();
        let after_unknown_user = service.verifications.load(Ordering::Relaxed);

        assert_eq!(after_wrong_password - before, 1);
        assert_eq!(after_unknown_user - after_wrong_password, 1);

        // The stand-in hash uses the configured parameters
        let dummy = service.dummy_hash.get().unwrap();
        assert!(dummy.starts_with("$argon2id$v=19$m=4096,t=1,p=1$"));
    }

    #[tokio::test]
    async fn test_unknown_user_with_dummy_plaintext_is_rejected() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));

        let result = service
            .login(login_request("nouser", DUMMY_PASSWORD))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_is_case_sensitive() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));
        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();

        let result = service.login(login_request("Alice", "secret123")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_identify_rejects_garbage_token() {
        let service = service_with(Arc::new(MemoryCredentialStore::new()));
        let result = service.identify("not-a-token").await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_identify_after_subject_removed() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = service_with(store.clone());

        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();
        let token = service
            .login(login_request("alice", "secret123"))
            .await
            .unwrap();

        store.remove("alice").await;

        let result = service.identify(&token.access_token).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_identify_rejects_token_from_other_secret() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = service_with(store.clone());
        service
            .register(register_request("alice", "a@x.com", "secret123"))
            .await
            .unwrap();

        let rotated = TokenService::new(&JwtConfig {
            secret: "rotated-secret".to_string(),
            access_token_ttl: Duration::from_secs(60),
        });
        let token = rotated.issue("alice", None).unwrap();

        let result = service.identify(&token).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_concurrent_registration_race() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = Arc::new(service_with(store.clone()));

        let first = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .register(register_request("alice", "a@x.com", "secret123"))
                    .await
            })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .register(register_request("alice", "a2@x.com", "secret456"))
                    .await
            })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(AuthError::DuplicateIdentity) | Err(AuthError::ConstraintViolation)
                )
            })
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            AuthError::from(StoreError::ConstraintViolation),
            AuthError::ConstraintViolation
        ));
        assert!(matches!(
            AuthError::from(StoreError::Database("down".to_string())),
            AuthError::Persistence(_)
        ));
    }
}
