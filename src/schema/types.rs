//! Field kinds and rules
//!
//! Supported kinds:
//! - integer: whole JSON number
//! - string: UTF-8 string
//! - date: ISO 8601 date or date-time string
//! - boolean: JSON boolean

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{is_empty_operand, parse_timestamp, Operator};

/// Declared type of a writable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    String,
    Date,
    Boolean,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::String => "string",
            FieldKind::Date => "date",
            FieldKind::Boolean => "boolean",
        }
    }

    /// Whether a non-null value has this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::String => value.is_string(),
            FieldKind::Date => value.as_str().and_then(parse_timestamp).is_some(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }

    /// Message reported when [`FieldKind::accepts`] fails
    pub fn type_message(&self, field: &str) -> String {
        match self {
            FieldKind::Integer => format!("{} must be an integer number", field),
            FieldKind::String => format!("{} must be a string", field),
            FieldKind::Date => format!("{} must be a valid ISO 8601 date string", field),
            FieldKind::Boolean => format!("{} must be a boolean value", field),
        }
    }

    /// Filter operators a field of this kind accepts
    pub fn allows_operator(&self, op: Operator) -> bool {
        match self {
            FieldKind::Integer | FieldKind::Date => {
                !matches!(op, Operator::Like | Operator::NotLike)
            }
            FieldKind::String => matches!(
                op,
                Operator::Eq
                    | Operator::Ne
                    | Operator::In
                    | Operator::NotIn
                    | Operator::Like
                    | Operator::NotLike
            ),
            FieldKind::Boolean => matches!(op, Operator::Eq | Operator::Ne),
        }
    }
}

/// Per-field input rule, checked without touching storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Value must be present and not empty
    Required,
    /// At most n characters
    MaxLength(usize),
    /// At least n characters
    MinLength(usize),
    Email,
    /// One of a fixed list of strings
    OneOf(Vec<String>),
    /// Number greater than zero
    Positive,
}

impl FieldRule {
    /// Checks a present, correctly typed value. Returns the failure message.
    pub fn check(&self, field: &str, value: &Value) -> Option<String> {
        match self {
            FieldRule::Required => {
                is_empty_operand(value).then(|| format!("{} should not be empty", field))
            }
            FieldRule::MaxLength(max) => {
                let len = value.as_str()?.chars().count();
                (len > *max).then(|| {
                    format!("{} must be shorter than or equal to {} characters", field, max)
                })
            }
            FieldRule::MinLength(min) => {
                let len = value.as_str()?.chars().count();
                (len < *min).then(|| {
                    format!("{} must be longer than or equal to {} characters", field, min)
                })
            }
            FieldRule::Email => {
                let s = value.as_str()?;
                let valid = email_pattern().is_some_and(|re| re.is_match(s));
                (!valid).then(|| format!("{} must be an email", field))
            }
            FieldRule::OneOf(allowed) => {
                let s = value.as_str()?;
                (!allowed.iter().any(|a| a == s)).then(|| {
                    format!(
                        "{} must be one of the following values: {}",
                        field,
                        allowed.join(", ")
                    )
                })
            }
            FieldRule::Positive => {
                let n = value.as_f64()?;
                (n <= 0.0).then(|| format!("{} must be a positive number", field))
            }
        }
    }
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok()
        })
        .as_ref()
}

/// How an array value is checked against the referenced entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistenceMode {
    /// At least one referenced id exists
    #[default]
    Any,
    /// Every referenced id exists
    All,
}

/// Rule that consults storage while validating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationalRule {
    /// No other row shares this field's value, together with `companions`
    Unique { companions: Vec<String> },
    /// Value is the id of a row in `entity`
    ExistsIn { entity: String, mode: ExistenceMode },
}
