//! Authentication API handlers
//!
//! Provides HTTP endpoints for registration, login and the current identity.

use crate::auth::{AccessToken, CurrentIdentity, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Form, Json,
};
use credgate_core::IdentityInfo;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Public identity as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<IdentityInfo> for IdentityResponse {
    fn from(info: IdentityInfo) -> Self {
        Self {
            id: info.id,
            username: info.username,
            email: info.email,
        }
    }
}

/// Register a new user account
///
/// # Responses
///
/// * `201 Created` - User successfully registered
/// * `400 Bad Request` - Invalid input, or username/email already registered
/// * `500 Internal Server Error` - Server error
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = IdentityResponse),
        (status = 400, description = "Invalid input or duplicate", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    tracing::info!(username = %request.username, email = %request.email, "Registration attempt");

    let identity = state.auth.register(request).await?;

    Ok((StatusCode::CREATED, Json(IdentityResponse::from(identity))))
}

/// Login with username and password
///
/// Accepts the OAuth2 password form (`application/x-www-form-urlencoded`).
///
/// # Responses
///
/// * `200 OK` - Authentication successful, returns a bearer token
/// * `401 Unauthorized` - Invalid credentials
/// * `500 Internal Server Error` - Server error
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful", body = AccessToken),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Form<LoginRequest>, FormRejection>,
) -> Result<Json<AccessToken>, AppError> {
    let Form(request) = payload?;
    tracing::info!(username = %request.username, "Login attempt");

    let token = state.auth.login(request).await?;

    tracing::debug!(
        token_prefix = %token.access_token.chars().take(20).collect::<String>(),
        "Returning token"
    );
    Ok(Json(token))
}

/// Get current user profile
///
/// # Responses
///
/// * `200 OK` - Identity the bearer token resolves to
/// * `401 Unauthorized` - Invalid, expired or orphaned token
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = IdentityResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me_handler(
    Extension(CurrentIdentity(identity)): Extension<CurrentIdentity>,
) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(identity.to_info()))
}
