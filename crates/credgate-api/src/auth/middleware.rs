//! Authentication middleware for protecting routes
//!
//! Extracts the bearer token from the Authorization header and resolves it to
//! a fresh identity through `AuthService::identify`. On success the identity
//! is added to request extensions as `CurrentIdentity`.

use super::jwt::extract_bearer_token;
use super::service::AuthError;
use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use credgate_core::Identity;
use std::sync::Arc;

/// Identity resolved for the current request
///
/// Extract in handlers with `Extension<CurrentIdentity>`.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

/// Authentication middleware that requires a valid bearer token
///
/// This middleware:
/// 1. Extracts the Authorization header
/// 2. Validates the Bearer token format
/// 3. Validates the JWT signature and expiration
/// 4. Re-reads the token's subject from the credential store
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use credgate_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/users/me", get(me_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_owned);

    let Some(token) = token else {
        audit_log(&AuditEvent::InvalidToken {
            reason: "missing or malformed Authorization header".to_string(),
        });
        return Err(AuthError::Unauthenticated.into());
    };

    let identity = state.auth.identify(&token).await?;

    request.extensions_mut().insert(CurrentIdentity(identity));

    Ok(next.run(request).await)
}
