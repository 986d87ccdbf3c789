use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Failure categories reported to clients as the `kind` of an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    UniquenessViolation,
    StateConflict,
    AuthorizationError,
    NotFound,
    ExternalFailure,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Elevated privilege required")]
    PrivilegeRequired,

    #[error("No active target for the current month")]
    NoActiveTarget,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid input")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("A memo is required when a discount is applied")]
    MemoRequired,

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Revenue entry already posted for this customer and month")]
    DuplicatePosting,

    #[error("Bed already has a customer")]
    AlreadyAssigned,

    #[error("Bed has no customer")]
    NotBound,

    #[error("Customer is inactive")]
    CustomerInactive,

    #[error("Customer already holds another bed")]
    CustomerDoubleBooked,

    #[error("Customer holds a bed; only releasing it changes their status")]
    CustomerHoldsBed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("File error: {0}")]
    File(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_)
            | AppError::Validation { .. }
            | AppError::InvalidFields(_)
            | AppError::MemoRequired => ErrorKind::ValidationError,
            AppError::Duplicate(_) | AppError::DuplicatePosting => ErrorKind::UniquenessViolation,
            AppError::AlreadyAssigned
            | AppError::NotBound
            | AppError::CustomerInactive
            | AppError::CustomerDoubleBooked
            | AppError::CustomerHoldsBed => ErrorKind::StateConflict,
            AppError::Unauthorized | AppError::PrivilegeRequired | AppError::NoActiveTarget => {
                ErrorKind::AuthorizationError
            }
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Mail(_) | AppError::File(_) => ErrorKind::ExternalFailure,
            AppError::Database(_) | AppError::Jwt(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Returns true when a store error was raised by a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// Maps a unique-constraint failure onto a domain error, passing others through.
pub fn on_unique_violation(err: sqlx::Error, conflict: impl FnOnce() -> AppError) -> AppError {
    if is_unique_violation(&err) {
        conflict()
    } else {
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let mut field: Option<String> = None;
        let (status, error_code, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            AppError::PrivilegeRequired => {
                (StatusCode::FORBIDDEN, "PRIVILEGE_REQUIRED", self.to_string())
            }
            AppError::NoActiveTarget => {
                (StatusCode::FORBIDDEN, "NO_ACTIVE_TARGET", self.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Validation { field: f, message } => {
                field = Some(f.clone());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    message.clone(),
                )
            }
            AppError::InvalidFields(errors) => {
                let fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|f| f.to_string())
                    .collect();
                field = Some(fields.join(","));
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    errors.to_string(),
                )
            }
            AppError::MemoRequired => {
                field = Some("memo".to_string());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "MEMO_REQUIRED",
                    self.to_string(),
                )
            }
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, "DUPLICATE", msg.clone()),
            AppError::DuplicatePosting => {
                (StatusCode::CONFLICT, "DUPLICATE_POSTING", self.to_string())
            }
            AppError::AlreadyAssigned => {
                (StatusCode::CONFLICT, "ALREADY_ASSIGNED", self.to_string())
            }
            AppError::NotBound => (StatusCode::CONFLICT, "NOT_BOUND", self.to_string()),
            AppError::CustomerInactive => {
                (StatusCode::CONFLICT, "CUSTOMER_INACTIVE", self.to_string())
            }
            AppError::CustomerDoubleBooked => (
                StatusCode::CONFLICT,
                "CUSTOMER_DOUBLE_BOOKED",
                self.to_string(),
            ),
            AppError::CustomerHoldsBed => {
                (StatusCode::CONFLICT, "CUSTOMER_HOLDS_BED", self.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            AppError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid token".to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
            AppError::Mail(msg) => (StatusCode::BAD_GATEWAY, "MAIL_ERROR", msg.clone()),
            AppError::File(msg) => (StatusCode::BAD_GATEWAY, "FILE_ERROR", msg.clone()),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "kind": kind,
                "code": error_code,
                "message": message,
                "field": field
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy_errors_are_state_conflicts() {
        for err in [
            AppError::AlreadyAssigned,
            AppError::NotBound,
            AppError::CustomerInactive,
            AppError::CustomerDoubleBooked,
            AppError::CustomerHoldsBed,
        ] {
            assert_eq!(err.kind(), ErrorKind::StateConflict);
        }
    }

    #[test]
    fn test_ledger_and_gate_error_kinds() {
        assert_eq!(
            AppError::DuplicatePosting.kind(),
            ErrorKind::UniquenessViolation
        );
        assert_eq!(AppError::MemoRequired.kind(), ErrorKind::ValidationError);
        assert_eq!(
            AppError::NoActiveTarget.kind(),
            ErrorKind::AuthorizationError
        );
        assert_eq!(
            AppError::PrivilegeRequired.kind(),
            ErrorKind::AuthorizationError
        );
        assert_eq!(
            AppError::Mail("timeout".into()).kind(),
            ErrorKind::ExternalFailure
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::DuplicatePosting.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::MemoRequired.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::NoActiveTarget.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("bed".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        let mapped = on_unique_violation(sqlx::Error::RowNotFound, || AppError::DuplicatePosting);
        assert!(matches!(mapped, AppError::Database(_)));
    }
}
