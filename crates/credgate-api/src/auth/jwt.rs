//! JWT token generation and validation
//!
//! Implements stateless bearer tokens signed with HMAC-SHA256. A token is a
//! compact `header.claims.signature` string; validity depends only on the
//! signature, the `exp` claim and the signing secret held by `TokenService`.

use credgate_core::AuthConfig;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Lifetime the service configures for access tokens unless overridden
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Lifetime used only when `TokenService::issue` is called without a TTL
///
/// Callers should always pass an explicit TTL; the auth service does.
pub const FALLBACK_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Algorithm every token is signed and validated with
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - username of the identity
    pub sub: String,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: u64,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token lifetime out of range")]
    LifetimeOverflow,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Access token lifetime
    pub access_token_ttl: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            access_token_ttl: Duration::from_secs(
                config.access_token_ttl_minutes.saturating_mul(60),
            ),
        }
    }
}

/// Issues and validates access tokens
///
/// The signing secret is fixed for the lifetime of the service. Rotating it
/// means building a new `TokenService`, which invalidates every token signed
/// by the old one.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_token_ttl: config.access_token_ttl,
        }
    }

    /// Configured access token lifetime
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Sign a token for `subject`, valid for `ttl` from now
    ///
    /// A `None` TTL falls back to `FALLBACK_TOKEN_TTL` (15 minutes), not to the
    /// configured access token lifetime.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String, JwtError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let ttl = ttl.unwrap_or(FALLBACK_TOKEN_TTL);

        let exp = now
            .checked_add(ttl.as_secs())
            .ok_or(JwtError::LifetimeOverflow)?;

        let claims = Claims {
            sub: subject.to_string(),
            exp,
            iat: now,
        };

        let token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)?;

        tracing::debug!(sub = subject, exp = claims.exp, "Token issued");
        Ok(token)
    }

    /// Sign a token with the configured access token lifetime
    pub fn issue_access_token(&self, subject: &str) -> Result<String, JwtError> {
        self.issue(subject, Some(self.access_token_ttl))
    }

    /// Verify signature and expiry, then return the claims
    ///
    /// Fails closed: anything short of a well-formed, correctly signed,
    /// unexpired HS256 token is an error.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            },
        )?;

        Ok(token_data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
///
/// The scheme is matched case-insensitively, as OAuth2 clients vary.
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
