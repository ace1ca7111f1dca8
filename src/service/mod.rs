//! Entity services
//!
//! Generic read and write operations over any [`Entity`]:
//! - `find` / `find_all` / `find_one` compile boundary queries and read
//! - `create` / `update` run merge, validation and persistence
//! - `remove` deletes by id
//!
//! Services hold an injected [`crate::storage::Connection`] and never open
//! storage themselves.

mod credential;
mod entity;
mod errors;
mod link;
mod pipeline;
mod service;

pub use credential::{hash_credential, hash_password, verify_password};
pub use entity::{decode, to_input, Entity};
pub use errors::{EngineError, EngineResult};
pub use link::LinkService;
pub use pipeline::{merge, PersistPhase, PhaseTracker};
pub use service::{EntityService, FindResponse};
