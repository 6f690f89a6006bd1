// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::{LedgerError, ProvisionError};
use crate::session::SessionError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),
    SessionExpired(String),

    // 403 Forbidden
    LicenseInactive(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Locked(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) | ApiError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) | ApiError::SessionExpired(_) => StatusCode::UNAUTHORIZED,
            ApiError::LicenseInactive(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Locked(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::ValidationError(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::SessionExpired(msg)
            | ApiError::LicenseInactive(msg)
            | ApiError::NotFound(msg)
            | ApiError::Locked(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::SessionExpired(_) => "SESSION_EXPIRED",
            ApiError::LicenseInactive(_) => "LICENSE_INACTIVE",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Locked(_) => "LOCK_TIMEOUT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn session_expired(message: impl Into<String>) -> Self {
        ApiError::SessionExpired(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TableNotFound(_) => ApiError::not_found("Transaction store not found"),
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                tracing::error!("Store error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::Store(e) => e.into(),
            ProvisionError::TemplateNotFound(t) => {
                tracing::error!("Provisioning template missing: {}", t);
                ApiError::internal_server_error("Unable to prepare your data store")
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(msg) => ApiError::validation_error(msg),
            SessionError::Auth => ApiError::unauthorized(err.to_string()),
            SessionError::License => ApiError::LicenseInactive(err.to_string()),
            SessionError::Expired => ApiError::session_expired(err.to_string()),
            SessionError::Provision(e) => e.into(),
            SessionError::Store(e) => e.into(),
            SessionError::Token(e) => {
                tracing::error!("Token error: {}", e);
                ApiError::internal_server_error("Unable to issue session token")
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::LockTimeout(e) => {
                ApiError::Locked(format!("Another change to this ledger is in progress ({})", e))
            }
            LedgerError::Store(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LockTimeout;
    use std::time::Duration;

    #[test]
    fn session_errors_map_to_statuses() {
        let cases = [
            (SessionError::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (SessionError::Auth, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (SessionError::License, StatusCode::FORBIDDEN, "LICENSE_INACTIVE"),
            (SessionError::Expired, StatusCode::UNAUTHORIZED, "SESSION_EXPIRED"),
        ];
        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), status);
            assert_eq!(api.error_code(), code);
        }
    }

    #[test]
    fn lock_timeout_is_a_conflict() {
        let err = LedgerError::LockTimeout(LockTimeout { tenant: "t".into(), waited: Duration::from_secs(20) });
        let api: ApiError = err.into();
        assert_eq!(api.status_code(), StatusCode::CONFLICT);
        assert_eq!(api.to_json()["code"], "LOCK_TIMEOUT");
        assert_eq!(api.to_json()["success"], false);
    }

    #[test]
    fn store_details_are_not_leaked() {
        let api: ApiError = StoreError::Corrupt { table: "t".into(), message: "secret detail".into() }.into();
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message().contains("secret detail"));
    }
}
