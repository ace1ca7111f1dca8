//! CLI error types
//!
//! Every failure ends the process with a non-zero exit and a JSON error on
//! stderr.

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ConfigError;
use crate::seed::SeedError;
use crate::service::EngineError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Bad argument value, e.g. an unknown entity or malformed JSON
    #[error("{0}")]
    Usage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        CliError::Usage(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CONFIG_ERROR",
            CliError::Seed(_) => "SEED_ERROR",
            CliError::Engine(e) => e.code(),
            CliError::Usage(_) => "USAGE_ERROR",
            CliError::Io(_) => "IO_ERROR",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            CliError::Engine(e) => e.status_code(),
            CliError::Usage(_) => 400,
            _ => 500,
        }
    }

    /// `{"code", "status", "message", "errors"?}`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "code": self.code(),
            "status": self.status_code(),
            "message": self.to_string(),
        });
        if let CliError::Engine(e) = self {
            if let Some(errors) = e.validation_errors() {
                body["errors"] = json!(errors.messages());
            }
        }
        body
    }
}
