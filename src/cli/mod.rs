//! CLI module for crudbase
//!
//! One process runs one operation:
//! - find / find-all / find-one: reads
//! - create / update / remove: validated writes
//! - link / unlink: many-to-many relations

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{open, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{parse_object, parse_query, write_error, write_json};
