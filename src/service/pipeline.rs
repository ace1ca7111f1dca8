//! Validate-and-persist pipeline phases
//!
//! ```text
//! Merging -> Validating -> Persisting -> Committed
//!                 |
//!                 +-------> Aborted
//! ```
//!
//! Storage failures in any phase abort the call with the storage error;
//! `Aborted` is reserved for validation failures.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::EntityDef;
use crate::storage::Record;

/// Phase of one create or update call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPhase {
    Merging,
    Validating,
    Persisting,
    Committed,
    Aborted,
}

impl PersistPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PersistPhase::Committed | PersistPhase::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersistPhase::Merging => "merging",
            PersistPhase::Validating => "validating",
            PersistPhase::Persisting => "persisting",
            PersistPhase::Committed => "committed",
            PersistPhase::Aborted => "aborted",
        }
    }
}

impl fmt::Display for PersistPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs the phase of one pipeline run
#[derive(Debug)]
pub struct PhaseTracker<'a> {
    entity: &'a str,
    operation: &'static str,
    phase: PersistPhase,
}

impl<'a> PhaseTracker<'a> {
    pub fn start(entity: &'a str, operation: &'static str) -> Self {
        debug!(entity, operation, phase = %PersistPhase::Merging, "persist phase");
        Self {
            entity,
            operation,
            phase: PersistPhase::Merging,
        }
    }

    pub fn enter(&mut self, phase: PersistPhase) {
        debug!(
            entity = self.entity,
            operation = self.operation,
            from = %self.phase,
            to = %phase,
            "persist phase"
        );
        self.phase = phase;
    }

    pub fn phase(&self) -> PersistPhase {
        self.phase
    }
}

/// Copies declared fields present in `input` onto `target`.
///
/// Storage-owned and undeclared keys are ignored. Returns the names of the
/// merged fields.
pub fn merge(def: &EntityDef, target: &mut Record, input: &Map<String, Value>) -> HashSet<String> {
    let mut merged = HashSet::new();
    for field in &def.fields {
        if let Some(value) = input.get(&field.name) {
            target.set(field.name.clone(), value.clone());
            merged.insert(field.name.clone());
        }
    }
    merged
}

/// Empty row shape: every declared field null
pub fn blank(def: &EntityDef) -> Record {
    let mut record = Record::new();
    for field in &def.fields {
        record.set(field.name.clone(), Value::Null);
    }
    record
}
