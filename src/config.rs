//! Engine configuration
//!
//! Loaded from a JSON file. Every key has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::DEFAULT_PAGE_SIZE;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Fallback log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seed file loaded at startup
    #[serde(default)]
    pub seed_path: Option<PathBuf>,

    /// Hash credential fields of seeded rows
    #[serde(default = "default_hash_seed_credentials")]
    pub hash_seed_credentials: bool,

    /// Page size when a query omits `pageSize`
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_hash_seed_credentials() -> bool {
    true
}
fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            seed_path: None,
            hash_seed_credentials: default_hash_seed_credentials(),
            default_page_size: default_page_size(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a config file. A relative `seed_path` is resolved
    /// against the config file's directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EngineConfig = serde_json::from_str(&content)?;

        if let (Some(seed), Some(dir)) = (config.seed_path.as_ref(), path.parent()) {
            if seed.is_relative() {
                config.seed_path = Some(dir.join(seed));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// `load` when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log_level
            )));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "default_page_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let file = write_config("{}");
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_page_size, 10);
        assert!(config.hash_seed_credentials);
    }

    #[test]
    fn test_relative_seed_path_resolved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crudbase.json");
        fs::write(&path, r#"{"seed_path": "seed.json", "log_level": "debug"}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.seed_path, Some(dir.path().join("seed.json")));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let file = write_config(r#"{"default_page_size": 0}"#);
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_level() {
        let file = write_config(r#"{"log_level": "loud"}"#);
        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let file = write_config(r#"{"data_dir": "/tmp"}"#);
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/crudbase.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(
            EngineConfig::load_or_default(None).unwrap(),
            EngineConfig::default()
        );
    }
}
