//! Storage subsystem
//!
//! The engine talks to storage only through the [`Storage`] trait, reached
//! via an injected [`Connection`]. [`MemoryStorage`] is the in-process
//! backend used by the command line and the tests.
//!
//! # Guarantees
//!
//! - `id` is assigned on insert and never changes
//! - `created_at` is set once; `updated_at` never moves backwards
//! - Unknown filter or sort columns fail with `UnknownField`
//! - After `close`, every call fails with `Unavailable`

mod connection;
mod errors;
mod memory;
mod record;
mod traits;

pub use connection::Connection;
pub use errors::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use record::{
    format_timestamp, Record, RecordId, CREATED_AT_FIELD, ID_FIELD, STORAGE_FIELDS,
    UPDATED_AT_FIELD,
};
pub use traits::Storage;
