//! Application state management

use crate::auth::{AuthService, JwtConfig, PasswordConfig, TokenService};
use credgate_core::config::AppConfig;
use credgate_core::{CredentialStore, MemoryCredentialStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
///
/// Everything here is built once at startup and only read afterwards.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Register/login/identify flows
    pub auth: AuthService,
}

impl AppState {
    /// Create new application state over the given credential store
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>) -> Self {
        let tokens = TokenService::new(&JwtConfig::from(&config.auth));
        let passwords = PasswordConfig::from(&config.auth);

        Self {
            auth: AuthService::new(store, tokens, passwords),
            config,
            start_time: Instant::now(),
        }
    }

    /// State backed by an empty in-memory store and cheap hashing parameters
    pub fn for_testing() -> Self {
        let mut config = AppConfig::default();
        config.auth.password_memory_cost = 4096;
        config.auth.password_time_cost = 1;
        config.auth.password_parallelism = 1;

        Self::new(config, Arc::new(MemoryCredentialStore::new()))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
