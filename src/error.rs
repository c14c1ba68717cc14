use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::attempt::AttemptStatus;
use crate::models::enrollment::EnrollmentStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Why an eligibility gate refused a request. Serialized as the `error` code of a 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    RetakeLimitReached,
    DeviceAlreadyCompleted,
    DeviceLimitReached,
    AdminOnly,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::RetakeLimitReached => "retake_limit_reached",
            DenialReason::DeviceAlreadyCompleted => "device_already_completed",
            DenialReason::DeviceLimitReached => "device_limit_reached",
            DenialReason::AdminOnly => "admin_only",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden ({}): {message}", .reason.code())]
    Forbidden {
        reason: DenialReason,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already registered with status {0}")]
    AlreadyRegistered(EnrollmentStatus),

    #[error("Attempt cannot move from {from} to {to}")]
    InvalidTransition { from: AttemptStatus, to: AttemptStatus },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn forbidden(reason: DenialReason, message: impl Into<String>) -> Self {
        Error::Forbidden {
            reason,
            message: message.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            Error::Forbidden { reason, message } => (
                StatusCode::FORBIDDEN,
                json!({ "error": reason.code(), "message": message }),
            ),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Error::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            Error::AlreadyRegistered(status) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "You are already registered for this course",
                    "already_registered": true,
                    "status": status.as_str(),
                }),
            ),
            err @ Error::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
            }
            Error::Validation(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            internal @ (Error::Database(_) | Error::Internal(_) | Error::Config(_)) => {
                tracing::error!(error = %internal, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Error::Internal(format!("password hashing failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Internal(format!("token signing failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: Error) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn forbidden_carries_reason_code() {
        let (status, body) = body_of(Error::forbidden(
            DenialReason::RetakeLimitReached,
            "Maximum retry count reached",
        ))
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "retake_limit_reached");
        assert_eq!(body["message"], "Maximum retry count reached");
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let (status, body) = body_of(Error::Internal("connection refused on 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn already_registered_reports_status() {
        let (status, body) = body_of(Error::AlreadyRegistered(EnrollmentStatus::Pending)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["already_registered"], true);
        assert_eq!(body["status"], "pending");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            Error::from(sqlx::Error::RowNotFound),
            Error::NotFound(_)
        ));
    }
}
