//! Centralized error handling.
//!
//! Every operation surfaces one [`AppError`]; callers outside the core map
//! [`ErrorKind`] onto whatever response their transport needs.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    /// The resource exists but is in a state that forbids the operation
    #[error("{0}")]
    InvalidState(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    // External collaborators
    #[error("Database error")]
    Database(#[from] DbErr),

    #[error("Storage error: {0}")]
    Storage(String),

    // Internal
    #[error("Internal error")]
    Internal(String),
}

/// Error taxonomy exposed to the (excluded) presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl AppError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => ErrorKind::Unauthenticated,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::NotFound => ErrorKind::NotFound,
            AppError::Conflict(_) | AppError::InvalidState(_) => ErrorKind::Conflict,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) | AppError::InvalidState(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// User-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::InvalidState(msg) => msg.clone(),
            AppError::Conflict(entity) => format!("{} already exists", entity),

            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                "A storage error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
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

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AppError::InvalidState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        AppError::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Translate a unique-constraint violation into `Conflict(entity)`.
    ///
    /// Racing inserts that slip past a pre-check end up here, so both paths
    /// report the same kind.
    pub fn from_db_unique(err: DbErr, entity: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(entity),
            _ => AppError::Database(err),
        }
    }
}

/// Format `validator` errors into a single user-facing message
pub fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(format_validation_errors(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(AppError::Unauthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(AppError::Forbidden.kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(AppError::conflict("Enrollment").kind(), ErrorKind::Conflict);
        assert_eq!(AppError::invalid_state("dropped").kind(), ErrorKind::Conflict);
        assert_eq!(AppError::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(AppError::storage("disk").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_user_message_hides_internal_details() {
        let err = AppError::internal("secret path /var/lib");
        assert_eq!(err.user_message(), "An internal error occurred");
        assert_eq!(AppError::conflict("Course").user_message(), "Course already exists");
    }

    #[test]
    fn test_non_unique_db_error_stays_database() {
        let err = AppError::from_db_unique(DbErr::Custom("boom".into()), "Lesson");
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_ok_or_not_found() {
        let missing: Option<u8> = None;
        assert!(matches!(missing.ok_or_not_found(), Err(AppError::NotFound)));
        assert_eq!(Some(3).ok_or_not_found().unwrap(), 3);
    }
}
