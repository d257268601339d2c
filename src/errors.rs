use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Storage failures are classified into one of four stable outcomes
/// (validation / conflict / unavailable / internal); each carries a
/// machine-readable code used in the JSON error envelope.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed or invalid request/write shape.
    Validation(String),
    /// Uniqueness constraint violated.
    Conflict(String),
    /// Storage unreachable (connection refused, pool exhausted, protocol mismatch).
    DatabaseUnavailable(String),
    /// Anything else.
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DatabaseUnavailable(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::DatabaseUnavailable(msg) => write!(f, "Database unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// 4xx responses carry the specific message; 5xx responses carry only a
    /// generic message, with detail retained in server-side logs.
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::DatabaseUnavailable(detail) => {
                tracing::error!("Database unavailable: {}", detail);
                "Database connection failed".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An unexpected error occurred".to_string()
            }
        };

        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": {
                "message": message,
                "code": self.code(),
                "status": status.as_u16(),
            },
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    /// Classifies a storage failure.
    ///
    /// Used identically by the create and list paths:
    /// - invalid write shape -> 400 VALIDATION_ERROR
    /// - unique violation    -> 409 CONFLICT
    /// - unreachable/protocol mismatch -> 503 DATABASE_ERROR
    /// - anything else       -> 500 INTERNAL_ERROR
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error;

        match &err {
            Error::Database(db_err) => {
                use sqlx::error::ErrorKind;
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        AppError::Conflict("Duplicate value (e.g. email already used)".to_string())
                    }
                    ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation
                    | ErrorKind::ForeignKeyViolation => {
                        tracing::warn!("Database rejected write: {}", db_err);
                        AppError::Validation("Invalid request data".to_string())
                    }
                    _ => AppError::Internal(db_err.to_string()),
                }
            }
            Error::ColumnNotFound(_)
            | Error::ColumnDecode { .. }
            | Error::TypeNotFound { .. }
            | Error::Decode(_)
            | Error::Encode(_) => {
                tracing::warn!("Invalid query shape: {}", err);
                AppError::Validation("Invalid request data".to_string())
            }
            Error::Io(_)
            | Error::Tls(_)
            | Error::Protocol(_)
            | Error::PoolTimedOut
            | Error::PoolClosed
            | Error::WorkerCrashed => AppError::DatabaseUnavailable(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}
