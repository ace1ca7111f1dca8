//! Validators that read storage
//!
//! Both hold the injected [`Connection`]; neither opens one on its own.
//! Storage failures propagate as errors and are never reported as a failed
//! constraint.

use serde_json::Value;

use super::errors::ValidationError;
use crate::query::{values_equal, FieldPredicate, IncludeSet, WhereClause};
use crate::schema::ExistenceMode;
use crate::storage::{Connection, Record, StorageResult, ID_FIELD};

/// Foreign key check: the value must be the id of a row in another entity
#[derive(Debug, Clone)]
pub struct ExistenceValidator {
    conn: Connection,
}

impl ExistenceValidator {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// `None` when the check passes. Absent and null values pass.
    pub async fn validate(
        &self,
        field: &str,
        value: Option<&Value>,
        entity: &str,
        mode: ExistenceMode,
    ) -> StorageResult<Option<ValidationError>> {
        let ids: Vec<Value> = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(values)) => dedup(values),
            Some(value) => vec![value.clone()],
        };

        let found = if ids.is_empty() {
            false
        } else {
            let filter = WhereClause::new().and(FieldPredicate::in_list(ID_FIELD, ids.clone()));
            match mode {
                ExistenceMode::Any => self.conn.exists(entity, &filter).await?,
                ExistenceMode::All => {
                    self.conn.count(entity, &filter).await? == ids.len() as u64
                }
            }
        };

        Ok((!found).then(|| {
            ValidationError::new(
                field,
                format!("{} field must contain id of existing {}", field, entity),
            )
        }))
    }
}

fn dedup(values: &[Value]) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(values.len());
    for v in values {
        if !unique.iter().any(|u| values_equal(u, v)) {
            unique.push(v.clone());
        }
    }
    unique
}

/// No other row may share the value of a field, optionally combined with
/// companion fields
#[derive(Debug, Clone)]
pub struct UniquenessValidator {
    conn: Connection,
}

impl UniquenessValidator {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Checks `field` of `record` within `entity`. `None` when unique.
    ///
    /// The lookup uses the record's current values of `field` and each
    /// companion; null or absent ones are left out, and an empty lookup
    /// passes. A record with an id whose persisted row already holds the
    /// same values collides only with itself and passes.
    pub async fn validate(
        &self,
        entity: &str,
        field: &str,
        companions: &[String],
        record: &Record,
    ) -> StorageResult<Option<ValidationError>> {
        let lookup: Vec<(&str, &Value)> = std::iter::once(field)
            .chain(companions.iter().map(String::as_str))
            .filter_map(|f| match record.get(f) {
                None | Some(Value::Null) => None,
                Some(v) => Some((f, v)),
            })
            .collect();
        if lookup.is_empty() {
            return Ok(None);
        }

        if let Some(id) = record.id() {
            let persisted = self.conn.find_by_id(entity, id, &IncludeSet::new()).await?;
            let Some(persisted) = persisted else {
                return Ok(None);
            };
            let unchanged = lookup.iter().all(|(f, v)| {
                persisted.get(f).is_some_and(|current| values_equal(current, v))
            });
            if unchanged {
                return Ok(None);
            }
        }

        let filter = lookup
            .iter()
            .fold(WhereClause::new(), |clause, (f, v)| {
                clause.and(FieldPredicate::eq(*f, (*v).clone()))
            });
        if !self.conn.exists(entity, &filter).await? {
            return Ok(None);
        }

        Ok(Some(ValidationError::new(field, unique_message(field, companions))))
    }
}

/// `a field must be unique`, `a and b fields must be unique`,
/// `a, b and c fields must be unique`
pub fn unique_message(field: &str, companions: &[String]) -> String {
    match companions {
        [] => format!("{} field must be unique", field),
        [only] => format!("{} and {} fields must be unique", field, only),
        [init @ .., last] => format!(
            "{}, {} and {} fields must be unique",
            field,
            init.join(", "),
            last
        ),
    }
}
