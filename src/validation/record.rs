//! Whole-record validation
//!
//! Runs the field rules in scope and every relational rule, field by field
//! in declaration order, and collects all failures. Storage errors abort
//! immediately.

use tracing::debug;

use super::errors::ValidationErrors;
use super::relational::{ExistenceValidator, UniquenessValidator};
use super::rules::{check_field, ValidationScope};
use crate::schema::{EntityDef, RelationalRule};
use crate::storage::{Connection, Record, StorageResult};

#[derive(Debug, Clone)]
pub struct RecordValidator {
    existence: ExistenceValidator,
    uniqueness: UniquenessValidator,
}

impl RecordValidator {
    pub fn new(conn: Connection) -> Self {
        Self {
            existence: ExistenceValidator::new(conn.clone()),
            uniqueness: UniquenessValidator::new(conn),
        }
    }

    /// Validates a merged record. An empty list means it may be written.
    pub async fn validate(
        &self,
        def: &EntityDef,
        record: &Record,
        scope: &ValidationScope,
    ) -> StorageResult<ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for field in &def.fields {
            if scope.includes(&field.name) {
                check_field(field, record.get(&field.name), &mut errors);
            }

            for rule in &field.relational {
                let failure = match rule {
                    RelationalRule::ExistsIn { entity, mode } => {
                        self.existence
                            .validate(&field.name, record.get(&field.name), entity, *mode)
                            .await?
                    }
                    RelationalRule::Unique { companions } => {
                        self.uniqueness
                            .validate(&def.name, &field.name, companions, record)
                            .await?
                    }
                };
                if let Some(error) = failure {
                    errors.push(error);
                }
            }
        }

        debug!(entity = %def.name, failures = errors.len(), "record validated");
        Ok(errors)
    }
}
