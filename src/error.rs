//! Error types for the circulation engine

use serde::Serialize;
use thiserror::Error;

/// Numeric error codes reported alongside every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    ItemNotAvailable = 7,
    Duplicate = 8,
    MaxBorrowsReached = 11,
    BadValue = 18,
    NoSuchData = 20,
    OutstandingFine = 22,
    LoanAlreadyReturned = 23,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Item not available: {0}")]
    Unavailable(String),

    #[error("Outstanding fine: {0}")]
    OutstandingFine(String),

    #[error("Loan limit reached: {0}")]
    LimitReached(String),

    #[error("Loan already closed: {0}")]
    AlreadyClosed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body printed by the command shell
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::Unavailable(_) => ErrorCode::ItemNotAvailable,
            AppError::OutstandingFine(_) => ErrorCode::OutstandingFine,
            AppError::LimitReached(_) => ErrorCode::MaxBorrowsReached,
            AppError::AlreadyClosed(_) => ErrorCode::LoanAlreadyReturned,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::Config(_) | AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = err.code();
        ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message: err.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NotFound("Loan 1".into()).code(), ErrorCode::NoSuchData);
        assert_eq!(AppError::Unavailable("Item 2".into()).code(), ErrorCode::ItemNotAvailable);
        assert_eq!(
            AppError::AlreadyClosed("Loan 1".into()).code(),
            ErrorCode::LoanAlreadyReturned
        );
        assert_eq!(AppError::Internal("boom".into()).code() as u32, 1);
    }

    #[test]
    fn test_error_response() {
        let err = AppError::LimitReached("3/3 open loans".into());
        let body = ErrorResponse::from(&err);
        assert_eq!(body.code, 11);
        assert_eq!(body.error, "MaxBorrowsReached");
        assert_eq!(body.message, "Loan limit reached: 3/3 open loans");
    }
}
