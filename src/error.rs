/// Unified error types for the admin service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the admin service
#[derive(Error, Debug)]
pub enum AdminError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing or malformed Authorization header
    #[error("Missing bearer token")]
    NoToken,

    /// Token failed verification. Expired, tampered and mis-scoped tokens
    /// are indistinguishable to the caller.
    #[error("Invalid token")]
    InvalidToken,

    /// Bad credentials. Unknown email and wrong password are reported
    /// identically to avoid account enumeration.
    #[error("Invalid email or password")]
    AuthFailed,

    /// Account exists but is deactivated
    #[error("Account is disabled")]
    AccountDisabled,

    /// Authenticated principal no longer allowed through the gate
    #[error("Access denied")]
    AccessDenied,

    /// Principal's role row is missing (data integrity issue)
    #[error("No role assigned")]
    NoRole,

    /// Principal lacks every permission that would satisfy the check. Names
    /// the required set, never the principal's own grants.
    #[error("Requires one of: {}", .required.join(", "))]
    Forbidden { required: Vec<String> },

    /// Refresh token not bound to an active session row
    #[error("Invalid session")]
    InvalidSession,

    /// Session row past its expiry
    #[error("Session expired")]
    SessionExpired,

    /// Login attempt ceiling reached for this client address
    #[error("Too many login attempts")]
    RateLimited { retry_after: std::time::Duration },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g. duplicate email, report already resolved)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Uniform error envelope: `{"success": false, "error": {"code", "message"}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AdminError {
    /// Stable machine-readable code for the envelope
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::NoToken => "NO_TOKEN",
            AdminError::InvalidToken => "INVALID_TOKEN",
            AdminError::AuthFailed => "AUTH_FAILED",
            AdminError::AccountDisabled => "ACCOUNT_DISABLED",
            AdminError::AccessDenied => "ACCESS_DENIED",
            AdminError::NoRole => "NO_ROLE",
            AdminError::Forbidden { .. } => "FORBIDDEN",
            AdminError::InvalidSession => "INVALID_SESSION",
            AdminError::SessionExpired => "SESSION_EXPIRED",
            AdminError::RateLimited { .. } => "RATE_LIMITED",
            AdminError::Validation(_) => "VALIDATION",
            AdminError::NotFound(_) => "NOT_FOUND",
            AdminError::Conflict(_) => "CONFLICT",
            AdminError::Database(_) | AdminError::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AdminError::NoToken
            | AdminError::InvalidToken
            | AdminError::AuthFailed
            | AdminError::InvalidSession
            | AdminError::SessionExpired => StatusCode::UNAUTHORIZED,
            AdminError::AccountDisabled
            | AdminError::AccessDenied
            | AdminError::NoRole
            | AdminError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AdminError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AdminError::Validation(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Conflict(_) => StatusCode::CONFLICT,
            AdminError::Database(_) | AdminError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Don't leak internal detail
            AdminError::Database(e) => {
                tracing::error!("database error: {}", e);
                "Internal server error".to_string()
            }
            AdminError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorEnvelope {
            success: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for admin service operations
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_codes() {
        assert_eq!(AdminError::NoToken.code(), "NO_TOKEN");
        assert_eq!(AdminError::InvalidToken.code(), "INVALID_TOKEN");
        assert_eq!(AdminError::AuthFailed.code(), "AUTH_FAILED");
        assert_eq!(AdminError::AccountDisabled.code(), "ACCOUNT_DISABLED");
        assert_eq!(AdminError::AccessDenied.code(), "ACCESS_DENIED");
        assert_eq!(AdminError::InvalidSession.code(), "INVALID_SESSION");
        assert_eq!(AdminError::SessionExpired.code(), "SESSION_EXPIRED");
        assert_eq!(
            AdminError::Forbidden { required: vec![] }.code(),
            "FORBIDDEN"
        );
    }

    #[test]
    fn test_forbidden_names_required_permissions() {
        let err = AdminError::Forbidden {
            required: vec!["reports:review".to_string(), "reports:dismiss".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("reports:review"));
        assert!(message.contains("reports:dismiss"));
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let err = AdminError::Internal("secret detail".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
