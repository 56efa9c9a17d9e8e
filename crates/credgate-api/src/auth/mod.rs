//! Authentication core
//!
//! This module provides the credential flows with the following components:
//! - Password hashing with Argon2 (72-byte input ceiling)
//! - Access token issuance and validation (HS256 JWT)
//! - Authentication service for register/login/identify
//! - Middleware resolving bearer tokens to identities

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{
    extract_bearer_token, Claims, JwtConfig, JwtError, TokenService, DEFAULT_ACCESS_TOKEN_TTL,
    FALLBACK_TOKEN_TTL,
};
pub use middleware::{auth_middleware, CurrentIdentity};
pub use password::{
    hash_password, hash_password_with_config, verify_password, PasswordConfig, PasswordError,
    MAX_PASSWORD_BYTES,
};
pub use service::{
    AccessToken, AuthError, AuthService, LoginRequest, RegisterRequest, TOKEN_TYPE,
};
