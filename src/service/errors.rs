//! Engine errors
//!
//! Client input errors map to 400, `NotFound` to 404, `StorageUnavailable`
//! to 503 and everything else to 500. `NotFound` carries no detail.

use thiserror::Error;

use crate::query::QueryError;
use crate::storage::StorageError;
use crate::validation::ValidationErrors;

/// Result type for service operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Service errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Unsupported filter operator
    #[error("filters.{field}: unsupported operator '{token}'")]
    InvalidOperator { field: String, token: String },

    /// Malformed operand, sort or page parameter
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// One or more constraints failed
    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    /// Target record does not exist
    #[error("Not Found")]
    NotFound,

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Backend could not be reached
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Other storage failure
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Credential could not be hashed
    #[error("credential error: {0}")]
    Credential(String),

    /// Stored row does not match the entity type
    #[error("decode error: {0}")]
    Decode(String),
}

impl EngineError {
    /// HTTP-style status code
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::InvalidOperator { .. }
            | EngineError::InvalidQuery(_)
            | EngineError::ValidationFailed(_) => 400,
            EngineError::NotFound => 404,
            EngineError::StorageUnavailable(_) => 503,
            EngineError::Storage(_) | EngineError::Credential(_) | EngineError::Decode(_) => 500,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidOperator { .. } => "INVALID_OPERATOR",
            EngineError::InvalidQuery(_) => "INVALID_QUERY",
            EngineError::ValidationFailed(_) => "VALIDATION_FAILED",
            EngineError::NotFound => "NOT_FOUND",
            EngineError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            EngineError::Storage(_) => "STORAGE_ERROR",
            EngineError::Credential(_) => "CREDENTIAL_ERROR",
            EngineError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Validation failures, if any
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            EngineError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<QueryError> for EngineError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidOperator { field, token } => {
                EngineError::InvalidOperator { field, token }
            }
            other => EngineError::InvalidQuery(other.to_string()),
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(reason) => EngineError::StorageUnavailable(reason),
            other => EngineError::Storage(other),
        }
    }
}

impl From<ValidationErrors> for EngineError {
    fn from(errors: ValidationErrors) -> Self {
        EngineError::ValidationFailed(errors)
    }
}
