//! Unified error handling for HTTP and gRPC.
//!
//! Provides a single error type that can be converted to:
//! - Axum HTTP responses (for the API gateway)
//! - Tonic gRPC status codes (for the cohort and identity services)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;
use tonic::Status;

/// Application error types with support for both HTTP and gRPC.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // Rate limiting
    #[error("Too many requests")]
    TooManyRequests,

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(sea_orm::DbErr),

    #[cfg(feature = "jwt")]
    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[cfg(feature = "cache")]
    #[error("Cache error")]
    Cache(#[from] redis::RedisError),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    // gRPC specific
    #[error("Service unavailable")]
    ServiceUnavailable(String),

    #[error("gRPC error: {0}")]
    Grpc(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::TooManyRequests => "TOO_MANY_REQUESTS",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => "AUTH_ERROR",
            #[cfg(feature = "cache")]
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::IdentityProvider(_) => "IDENTITY_PROVIDER_ERROR",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Grpc(_) => "GRPC_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::IdentityProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::Validation(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Conflict(msg) => {
                // Avoid duplicating "already exists" when converted from gRPC
                if msg.ends_with("already exists") {
                    msg.clone()
                } else {
                    format!("{} already exists", msg)
                }
            }

            // Hide details for internal/security errors
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            #[cfg(feature = "jwt")]
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                "Invalid or expired token".to_string()
            }
            #[cfg(feature = "cache")]
            AppError::Cache(e) => {
                tracing::error!("Cache error: {:?}", e);
                "A cache error occurred".to_string()
            }
            AppError::IdentityProvider(msg) => {
                tracing::error!("Identity provider error: {}", msg);
                "The identity provider rejected the request".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::ServiceUnavailable(service) => {
                tracing::error!("Service unavailable: {}", service);
                format!("Service {} is unavailable", service)
            }
            AppError::Grpc(msg) => {
                tracing::error!("gRPC error: {}", msg);
                "A service communication error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// gRPC Status (Tonic)
// =============================================================================

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        let code = match &err {
            AppError::Unauthorized => tonic::Code::Unauthenticated,
            #[cfg(feature = "jwt")]
            AppError::Jwt(_) => tonic::Code::Unauthenticated,
            AppError::Forbidden => tonic::Code::PermissionDenied,
            AppError::NotFound => tonic::Code::NotFound,
            AppError::Conflict(_) => tonic::Code::AlreadyExists,
            AppError::Validation(_) | AppError::BadRequest(_) => tonic::Code::InvalidArgument,
            AppError::TooManyRequests => tonic::Code::ResourceExhausted,
            AppError::IdentityProvider(_) => tonic::Code::FailedPrecondition,
            AppError::ServiceUnavailable(_) => tonic::Code::Unavailable,
            _ => tonic::Code::Internal,
        };

        Status::new(code, err.user_message())
    }
}

impl From<Status> for AppError {
    fn from(status: Status) -> Self {
        match status.code() {
            tonic::Code::Unauthenticated => AppError::Unauthorized,
            tonic::Code::PermissionDenied => AppError::Forbidden,
            tonic::Code::NotFound => AppError::NotFound,
            tonic::Code::AlreadyExists => AppError::Conflict(status.message().to_string()),
            tonic::Code::InvalidArgument => AppError::Validation(status.message().to_string()),
            tonic::Code::ResourceExhausted => AppError::TooManyRequests,
            tonic::Code::FailedPrecondition => {
                AppError::IdentityProvider(status.message().to_string())
            }
            tonic::Code::Unavailable => AppError::ServiceUnavailable(status.message().to_string()),
            _ => AppError::Grpc(status.message().to_string()),
        }
    }
}

// =============================================================================
// Backend Error Conversion
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        // Unique indexes back the "already invited" and "already answered" rules.
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint violation: {}", detail);
                AppError::Conflict("Record".to_string())
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!("Foreign key violation: {}", detail);
                AppError::NotFound
            }
            _ => AppError::Database(err),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            AppError::ServiceUnavailable("identity provider".to_string())
        } else {
            AppError::IdentityProvider(err.to_string())
        }
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            rule @ (DomainError::SurveyClosed | DomainError::SelfDemotion) => {
                AppError::BadRequest(rule.to_string())
            }
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn identity_provider(msg: impl Into<String>) -> Self {
        AppError::IdentityProvider(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("Student").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::identity_provider("boom").status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::internal("connection string leaked");
        assert_eq!(err.user_message(), "An internal error occurred");
    }

    #[test]
    fn test_conflict_message_not_duplicated() {
        assert_eq!(
            AppError::conflict("Student").user_message(),
            "Student already exists"
        );
        assert_eq!(
            AppError::conflict("Student already exists").user_message(),
            "Student already exists"
        );
    }

    #[test]
    fn test_status_round_trip_keeps_meaning() {
        let cases = vec![
            AppError::Unauthorized,
            AppError::Forbidden,
            AppError::NotFound,
            AppError::conflict("Survey response"),
            AppError::validation("Rating must be between 1 and 5"),
            AppError::identity_provider("invitation rejected"),
        ];

        for err in cases {
            let code = err.code();
            let back = AppError::from(Status::from(err));
            assert_eq!(back.code(), code);
        }
    }

    #[test]
    fn test_domain_error_conversion() {
        let err = AppError::from(DomainError::validation("Title cannot be empty"));
        assert!(matches!(err, AppError::Validation(ref m) if m == "Title cannot be empty"));
        assert!(matches!(
            AppError::from(DomainError::SurveyClosed),
            AppError::BadRequest(ref m) if m == "This survey is closed"
        ));
    }
}
