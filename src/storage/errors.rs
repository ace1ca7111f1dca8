//! Storage errors
//!
//! `Unavailable` is fatal for the current operation and never retried here.
//! The remaining variants describe reads or writes the backend cannot map
//! onto its tables.

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Connection closed or never established
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Entity has no table in this backend
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// Filter or sort column does not exist
    #[error("unknown column '{field}' on {entity}")]
    UnknownField { entity: String, field: String },

    /// Include or link names a relation the entity does not declare
    #[error("unknown relation '{relation}' on {entity}")]
    UnknownRelation { entity: String, relation: String },

    /// Write targeted a row that is not there
    #[error("{entity} row {id} not found")]
    NotFound { entity: String, id: u64 },

    /// Row could not be written in the shape the table expects
    #[error("invalid row for {entity}: {reason}")]
    InvalidRow { entity: String, reason: String },
}

impl StorageError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "STORAGE_UNAVAILABLE",
            StorageError::UnknownEntity(_) => "STORAGE_UNKNOWN_ENTITY",
            StorageError::UnknownField { .. } => "STORAGE_UNKNOWN_FIELD",
            StorageError::UnknownRelation { .. } => "STORAGE_UNKNOWN_RELATION",
            StorageError::NotFound { .. } => "STORAGE_NOT_FOUND",
            StorageError::InvalidRow { .. } => "STORAGE_INVALID_ROW",
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }

    pub(crate) fn unknown_field(entity: &str, field: &str) -> Self {
        StorageError::UnknownField {
            entity: entity.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn unknown_relation(entity: &str, relation: &str) -> Self {
        StorageError::UnknownRelation {
            entity: entity.to_string(),
            relation: relation.to_string(),
        }
    }
}
