//! Security audit logging for authentication events
//!
//! All audit events are logged at INFO level with the "audit" target,
//! making them easy to filter and route to security monitoring systems.
//!
//! Failure reasons that are hidden from clients (unknown username versus wrong
//! password, expired versus forged token) are recorded here and nowhere else.
//!
//! # Example
//!
//! ```ignore
//! use credgate_api::audit::{AuditEvent, audit_log};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: identity.id,
//!     username: identity.username.clone(),
//! });
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events for authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user login
    LoginSuccess { user_id: i64, username: String },

    /// Failed login attempt
    LoginFailure { username: String, reason: String },

    /// Successful user registration
    RegistrationSuccess { user_id: i64, username: String },

    /// Failed registration attempt
    RegistrationFailure { username: String, reason: String },

    /// Invalid, expired or orphaned token used
    InvalidToken { reason: String },
}

impl AuditEvent {
    /// Short human-readable label used as the log message
    pub fn label(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::InvalidToken { .. } => "Invalid token",
        }
    }
}

/// Log a security audit event with structured fields
///
/// The event is also serialized to JSON under the `event` field so log
/// aggregators can index it without parsing the message.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess { user_id, username }
        | AuditEvent::RegistrationSuccess { user_id, username } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                "{}",
                event.label()
            );
        }
        AuditEvent::LoginFailure { username, reason }
        | AuditEvent::RegistrationFailure { username, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                "{}",
                event.label()
            );
        }
        AuditEvent::InvalidToken { reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                "{}",
                event.label()
            );
        }
    }
}
