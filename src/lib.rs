//! crudbase - declarative queries and validated writes for admin APIs
//!
//! - `query`: filter, sort and pagination compilers
//! - `storage`: storage capability trait, connection handle, memory backend
//! - `schema`: entity definitions and boundary query policy
//! - `validation`: field rules and storage-backed relational validators
//! - `service`: generic entity service and persist pipeline

pub mod cli;
pub mod config;
pub mod entities;
pub mod observability;
pub mod query;
pub mod schema;
pub mod seed;
pub mod service;
pub mod storage;
pub mod validation;
