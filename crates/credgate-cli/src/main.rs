//! credgate CLI - Command-line interface
//!
//! Usage:
//!   credgate migrate
//!   credgate register <username> <email> <password>
//!   credgate login <username> <password>
//!   credgate whoami <token>
//!   credgate hash-password <password>

use anyhow::Context;
use clap::{Parser, Subcommand};
use credgate_api::auth::{hash_password_with_config, LoginRequest, PasswordConfig, RegisterRequest};
use credgate_api::state::AppState;
use credgate_api::telemetry::init_tracing;
use credgate_core::config::AppConfig;
use credgate_core::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "credgate")]
#[command(about = "Credential registration, login and token inspection")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, env = "CREDGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory store instead of PostgreSQL
    ///
    /// Only meaningful for `register` dry runs: the store is empty on every
    /// invocation, so `login`, `whoami` and `migrate` reject it.
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the users table if it does not exist
    Migrate,
    /// Register a new identity
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Authenticate and print an access token
    Login { username: String, password: String },
    /// Resolve a token to the identity it was issued for
    Whoami { token: String },
    /// Print a password hash for manual seeding
    HashPassword { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path.clone())?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    init_tracing(&config.logging);
    config.validate()?;

    match cli.command {
        Commands::Migrate => {
            require_persistent_store("migrate", cli.memory)?;
            let store = PgCredentialStore::connect(&config.database)
                .await
                .context("Failed to connect to the credential store")?;
            store.ensure_schema().await?;
            println!("users table is ready");
        }
        Commands::HashPassword { password } => {
            let hash = hash_password_with_config(&password, &PasswordConfig::from(&config.auth))?;
            println!("{}", hash);
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let state = build_state(config, cli.memory).await?;
            let info = state
                .auth
                .register(RegisterRequest {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Login { username, password } => {
            require_persistent_store("login", cli.memory)?;
            let state = build_state(config, cli.memory).await?;
            let token = state
                .auth
                .login(LoginRequest { username, password })
                .await?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        Commands::Whoami { token } => {
            require_persistent_store("whoami", cli.memory)?;
            let state = build_state(config, cli.memory).await?;
            let identity = state.auth.identify(&token).await?;
            println!("{}", serde_json::to_string_pretty(&identity.to_info())?);
        }
    }

    Ok(())
}

fn require_persistent_store(command: &str, memory: bool) -> anyhow::Result<()> {
    anyhow::ensure!(
        !memory,
        "`{command}` needs the PostgreSQL store; --memory starts empty on every run"
    );
    Ok(())
}

async fn build_state(config: AppConfig, memory: bool) -> anyhow::Result<AppState> {
    let store: Arc<dyn CredentialStore> = if memory {
        tracing::warn!("Using in-memory credential store; nothing is persisted");
        Arc::new(MemoryCredentialStore::new())
    } else {
        let store = PgCredentialStore::connect(&config.database)
            .await
            .context("Failed to connect to the credential store")?;
        Arc::new(store)
    };

    Ok(AppState::new(config, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_register() {
        let cli = Cli::try_parse_from([
            "credgate",
            "--memory",
            "register",
            "alice",
            "a@x.com",
            "secret123",
        ])
        .unwrap();

        assert!(cli.memory);
        match cli.command {
            Commands::Register { username, email, .. } => {
                assert_eq!(username, "alice");
                assert_eq!(email, "a@x.com");
            }
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn test_memory_store_rejected_for_lookups() {
        for command in ["login", "whoami", "migrate"] {
            let err = require_persistent_store(command, true).unwrap_err();
            assert!(err.to_string().contains(command));
        }
        assert!(require_persistent_store("login", false).is_ok());
    }

    #[test]
    fn test_parse_hash_password() {
        let cli = Cli::try_parse_from(["credgate", "hash-password", "pw"]).unwrap();
        assert!(matches!(cli.command, Commands::HashPassword { .. }));
    }
}
