//! Validation subsystem
//!
//! Field rules are pure and run on the fields in scope. Relational rules
//! (existence, uniqueness) read storage through an injected connection and
//! run on the merged record. Failures are collected, never short-circuited.

mod errors;
mod record;
mod relational;
mod rules;

pub use errors::{ValidationError, ValidationErrors};
pub use record::RecordValidator;
pub use relational::{unique_message, ExistenceValidator, UniquenessValidator};
pub use rules::ValidationScope;
