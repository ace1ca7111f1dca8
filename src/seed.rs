//! Startup seeding
//!
//! A seed file is a JSON object keyed by table name:
//!
//! ```json
//! { "users": [{ "id": 1, "name": "..." }], "articles_tags": [{ "article_id": 1, "tag_id": 2 }] }
//! ```
//!
//! Tables load in a fixed order so join rows come after both sides. Ids and
//! timestamps are kept as given.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::service::{hash_password, EngineError};
use crate::storage::{Connection, Record, StorageError};

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid seed file: {0}")]
    Parse(String),

    #[error("seeding {table} failed: {source}")]
    Storage { table: String, source: StorageError },

    #[error("seeding {table} failed: {source}")]
    Credential { table: String, source: EngineError },
}

/// Load order for known tables; unknown tables follow in file order
pub const TABLE_ORDER: [&str; 6] = [
    "users",
    "articles",
    "contents",
    "tags",
    "articles_tags",
    "admins",
];

/// Parsed seed file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSet {
    tables: Vec<(String, Vec<Record>)>,
}

impl SeedSet {
    pub fn load(path: &Path) -> SeedResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> SeedResult<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| SeedError::Parse(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(SeedError::Parse("seed file must be an object".to_string()));
        };
        Self::from_map(map)
    }

    fn from_map(map: Map<String, Value>) -> SeedResult<Self> {
        let mut tables = Vec::with_capacity(map.len());
        for (table, rows) in map {
            let rows: Vec<Record> = serde_json::from_value(rows)
                .map_err(|e| SeedError::Parse(format!("{}: {}", table, e)))?;
            tables.push((table, rows));
        }
        tables.sort_by_key(|(table, _)| {
            TABLE_ORDER
                .iter()
                .position(|t| *t == table.as_str())
                .unwrap_or(TABLE_ORDER.len())
        });
        Ok(Self { tables })
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tables.iter().map(|(t, rows)| (t.as_str(), rows.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|(_, rows)| rows.is_empty())
    }
}

/// Writes a [`SeedSet`] into storage
pub struct Seeder {
    conn: Connection,
    hash_credentials: bool,
}

impl Seeder {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            hash_credentials: true,
        }
    }

    pub fn hash_credentials(mut self, enabled: bool) -> Self {
        self.hash_credentials = enabled;
        self
    }

    /// Returns the number of rows written
    pub async fn run(&self, seeds: SeedSet) -> SeedResult<usize> {
        info!(tables = seeds.tables.len(), "seeding storage");
        let mut total = 0;

        for (table, mut rows) in seeds.tables {
            if self.hash_credentials {
                self.hash_rows(&table, &mut rows)?;
            }
            let written = self
                .conn
                .import(&table, rows)
                .await
                .map_err(|source| SeedError::Storage {
                    table: table.clone(),
                    source,
                })?;
            info!(table = %table, rows = written, "seeded");
            total += written;
        }

        info!(rows = total, "seeding done");
        Ok(total)
    }

    fn hash_rows(&self, table: &str, rows: &mut [Record]) -> SeedResult<()> {
        let Some(field) = self
            .conn
            .registry()
            .by_table(table)
            .and_then(|def| def.credential.clone())
        else {
            return Ok(());
        };

        for row in rows.iter_mut() {
            if let Some(Value::String(plain)) = row.get(&field) {
                let hash = hash_password(plain).map_err(|source| SeedError::Credential {
                    table: table.to_string(),
                    source,
                })?;
                row.set(field.as_str(), Value::String(hash));
            }
        }
        Ok(())
    }
}
