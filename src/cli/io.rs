//! JSON I/O handling for CLI
//!
//! - Arguments carrying JSON must be objects
//! - Results go to stdout, errors to stderr, one JSON document each

use std::io::{self, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{CliError, CliResult};

/// Parses a JSON object argument
pub fn parse_object(name: &str, raw: &str) -> CliResult<Map<String, Value>> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::usage(format!("--{} must be a JSON object", name))),
        Err(e) => Err(CliError::usage(format!("--{} is not valid JSON: {}", name, e))),
    }
}

/// Parses an optional JSON argument into a typed query, `Default` if absent
pub fn parse_query<T: DeserializeOwned + Default>(raw: Option<&str>) -> CliResult<T> {
    match raw {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| CliError::usage(format!("--query is invalid: {}", e))),
        None => Ok(T::default()),
    }
}

/// Write a result to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::from)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write an error to stderr
pub fn write_error(err: &CliError) {
    let mut stderr = io::stderr().lock();
    let _ = serde_json::to_writer(&mut stderr, &err.to_json());
    let _ = writeln!(stderr);
}
