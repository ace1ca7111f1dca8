//! Query compilation errors
//!
//! Raised while turning caller-supplied filters, sorts and page parameters
//! into a [`ReadQuery`](super::ReadQuery). All of them are client input
//! errors; none of them touch storage.

use thiserror::Error;

/// Result type for query compilation
pub type QueryResult<T> = Result<T, QueryError>;

/// Query compilation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Operator token outside the closed operator set
    #[error("filters.{field}: unsupported operator '{token}'")]
    InvalidOperator { field: String, token: String },

    /// Operand does not have the shape the operator needs
    #[error("filters.{field}.{token}: {reason}")]
    InvalidOperand {
        field: String,
        token: String,
        reason: String,
    },

    /// Field is not in the entity's filterable list
    #[error("filters.{field}: field is not filterable")]
    FieldNotFilterable { field: String },

    /// A field filter was not an operator object
    #[error("filters.{field}: expected an object of operators")]
    InvalidFieldFilter { field: String },

    /// Sort direction other than asc/desc
    #[error("sorts.{field}: invalid direction '{direction}'")]
    InvalidSort { field: String, direction: String },

    /// page or pageSize below 1
    #[error("{param} must be a positive integer")]
    InvalidPage { param: &'static str },
}

impl QueryError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidOperator { .. } => "INVALID_OPERATOR",
            QueryError::InvalidOperand { .. } => "INVALID_OPERAND",
            QueryError::FieldNotFilterable { .. } => "FIELD_NOT_FILTERABLE",
            QueryError::InvalidFieldFilter { .. } => "INVALID_FIELD_FILTER",
            QueryError::InvalidSort { .. } => "INVALID_SORT",
            QueryError::InvalidPage { .. } => "INVALID_PAGE",
        }
    }

    pub(crate) fn operand(field: &str, token: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidOperand {
            field: field.to_string(),
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operator_names_field_and_token() {
        let err = QueryError::InvalidOperator {
            field: "id".to_string(),
            token: "$foo".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("filters.id"));
        assert!(display.contains("$foo"));
        assert_eq!(err.code(), "INVALID_OPERATOR");
    }

    #[test]
    fn test_invalid_page_display() {
        let err = QueryError::InvalidPage { param: "pageSize" };
        assert_eq!(err.to_string(), "pageSize must be a positive integer");
    }
}
