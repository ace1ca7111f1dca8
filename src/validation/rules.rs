//! Field-level checks
//!
//! Pure checks of a merged record against its entity's field rules. Nothing
//! here touches storage.

use std::collections::HashSet;

use serde_json::Value;

use super::errors::ValidationErrors;
use crate::schema::{EntityDef, FieldDef, FieldRule};
use crate::storage::Record;

/// Which declared fields are checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationScope {
    /// Every declared field
    All,
    /// Only the named fields, those present in an update input
    Only(HashSet<String>),
}

impl ValidationScope {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            ValidationScope::All => true,
            ValidationScope::Only(fields) => fields.contains(field),
        }
    }
}

/// Absent values only fail `Required`. A value of the wrong kind reports the
/// kind and skips the remaining rules.
pub(crate) fn check_field(
    field: &FieldDef,
    value: Option<&Value>,
    errors: &mut ValidationErrors,
) {
    let name = field.name.as_str();
    let value = match value {
        None | Some(Value::Null) => {
            if field.is_required() {
                errors.add(name, format!("{} should not be empty", name));
            }
            return;
        }
        Some(value) => value,
    };

    if let Some(message) = field
        .rules
        .iter()
        .filter(|r| **r == FieldRule::Required)
        .find_map(|r| r.check(name, value))
    {
        errors.add(name, message);
    }

    if !field.kind.accepts(value) {
        errors.add(name, field.kind.type_message(name));
        return;
    }

    for rule in field.rules.iter().filter(|r| **r != FieldRule::Required) {
        if let Some(message) = rule.check(name, value) {
            errors.add(name, message);
        }
    }
}
