/// Password hashing and verification using Argon2id
///
/// Implements password hashing with these properties:
/// - Algorithm: Argon2id (memory-hard, resistant to GPU attacks)
/// - Memory: 64 MB, Iterations: 3, Parallelism: 4 (configurable)
/// - Salt: 16 bytes random
/// - Output: PHC string embedding algorithm, version, costs and salt
///
/// # Input ceiling
///
/// Every password is truncated to `MAX_PASSWORD_BYTES` (72) bytes before it is
/// hashed or verified. This keeps hashes interchangeable with the bcrypt rows
/// written by earlier deployments, which had the same ceiling. Two passwords
/// that share their first 72 bytes are therefore the same password.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use credgate_core::AuthConfig;
use thiserror::Error;

/// Bytes of a password that take part in hashing
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),
}

/// Password hashing configuration
///
/// These parameters are tuned for security while maintaining acceptable performance.
/// Increasing memory or iterations improves security but slows down hashing.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (threads, default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
            output_len: Some(32),
        }
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.password_memory_cost,
            time_cost: config.password_time_cost,
            parallelism: config.password_parallelism,
            ..Default::default()
        }
    }
}

impl PasswordConfig {
    /// Create Argon2 parameters from this configuration
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

/// Cut a password down to the bytes that take part in hashing
///
/// Works on bytes, not characters: a multi-byte character straddling the
/// boundary is split, exactly as a bcrypt implementation would.
pub fn truncate_password(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(MAX_PASSWORD_BYTES)]
}

/// Hash a plaintext password using Argon2id with default parameters
///
/// # Example
///
/// ```no_run
/// use credgate_api::auth::password::hash_password;
///
/// let hash = hash_password("secret123").expect("Failed to hash password");
/// // Output: $argon2id$v=19$m=65536,t=3,p=4$...
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

/// Hash a password with custom configuration
///
/// # Returns
///
/// * `Ok(String)` - PHC string format hash, safe to store verbatim
/// * `Err(PasswordError)` - If the parameters are invalid or hashing fails
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(truncate_password(password), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// Never fails: a malformed or unsupported hash string verifies as `false`.
/// Comparison of the derived hash is constant-time inside the hash crates.
/// Legacy bcrypt hashes (`$2a$`, `$2b$`, `$2y$`) are accepted as well.
///
/// # Example
///
/// ```no_run
/// use credgate_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("secret123").unwrap();
/// assert!(verify_password("secret123", &hash));
/// assert!(!verify_password("wrongpass", &hash));
/// ```
pub fn verify_password(password: &str, hash: &str) -> bool {
    let candidate = truncate_password(password);

    if is_bcrypt_hash(hash) {
        return bcrypt::verify(candidate, hash).unwrap_or(false);
    }

    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(candidate, &parsed_hash)
        .is_ok()
}

fn is_bcrypt_hash(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Light parameters so the property tests stay fast
    fn test_config() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "SecureP@ssw0rd!";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(verify_password(password, &hash));
        assert!(!verify_password("WrongPassword", &hash));
    }

    #[test]
    fn test_hash_is_self_describing() {
        let hash = hash_password_with_config("secret123", &test_config()).unwrap();

        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(hash.contains("m=4096"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
        assert!(hash.len() <= 255);
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        // Due to random salt, same password should produce different hashes
        let password = "SamePassword123!";

        let hash1 = hash_password_with_config(password, &test_config()).unwrap();
        let hash2 = hash_password_with_config(password, &test_config()).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1));
        assert!(verify_password(password, &hash2));
    }

    #[test]
    fn test_malformed_hash_is_false() {
        assert!(!verify_password("password", "invalid-hash-format"));
        assert!(!verify_password("password", ""));
        assert!(!verify_password("password", "$2b$12$short"));
        assert!(!verify_password("password", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn test_truncates_at_72_bytes() {
        let base = "a".repeat(MAX_PASSWORD_BYTES);
        let first = format!("{base}-first-suffix");
        let second = format!("{base}-another-suffix");

        let hash = hash_password_with_config(&first, &test_config()).unwrap();

        // Beyond byte 72 nothing is compared
        assert!(verify_password(&second, &hash));
        assert!(verify_password(&base, &hash));
        // One byte short of the ceiling is still a different password
        assert!(!verify_password(&base[..MAX_PASSWORD_BYTES - 1], &hash));
    }

    #[test]
    fn test_truncate_splits_on_bytes() {
        let password = format!("{}é", "a".repeat(MAX_PASSWORD_BYTES - 1));
        assert_eq!(truncate_password(&password).len(), MAX_PASSWORD_BYTES);
        assert_eq!(truncate_password("short"), b"short");
    }

    #[test]
    fn test_verifies_legacy_bcrypt_hash() {
        let legacy = bcrypt::hash("secret123", 4).unwrap();

        assert!(verify_password("secret123", &legacy));
        assert!(!verify_password("wrongpass", &legacy));
    }

    #[test]
    fn test_config_from_auth_config() {
        let auth = AuthConfig {
            password_memory_cost: 8192,
            password_time_cost: 2,
            password_parallelism: 1,
            ..Default::default()
        };
        let config = PasswordConfig::from(&auth);

        assert_eq!(config.memory_cost, 8192);
        assert_eq!(config.time_cost, 2);
        assert_eq!(config.parallelism, 1);
        assert_eq!(config.output_len, Some(32));
    }

    #[test]
    fn test_invalid_params() {
        let config = PasswordConfig {
            memory_cost: 1,
            ..test_config()
        };
        assert!(matches!(
            hash_password_with_config("pw", &config),
            Err(PasswordError::InvalidParams(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_hash_then_verify(password in ".{0,100}", other in ".{0,100}") {
            let hash = hash_password_with_config(&password, &test_config()).unwrap();
            prop_assert!(verify_password(&password, &hash));

            if truncate_password(&password) != truncate_password(&other) {
                prop_assert!(!verify_password(&other, &hash));
            }
        }
    }
}
