//! Entity schema
//!
//! Declares what each entity looks like to the engine: writable fields with
//! their kinds and input rules, relational rules that consult storage,
//! relations that can be included on read, and the credential field.
//!
//! # Rule evaluation
//!
//! - `create` checks every declared field
//! - `update` checks only the fields present in the input
//! - Relational rules always run against the merged record

mod entity;
mod policy;
mod registry;
mod types;

pub use entity::{EntityDef, FieldDef, RelationDef, RelationKind};
pub use policy::QueryPolicy;
pub use registry::EntityRegistry;
pub use types::{ExistenceMode, FieldKind, FieldRule, RelationalRule};
