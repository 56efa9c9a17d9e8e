//! credgate API - credential issuance and verification service
//!
//! Registers identities, authenticates username/password pairs and issues
//! bearer tokens that resolve back to a stored identity on every request.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::create_router;

use state::AppState;
use std::sync::Arc;

/// Router over an in-memory store, for integration tests
pub fn create_router_for_testing() -> axum::Router {
    create_router(Arc::new(AppState::for_testing()))
}
