use async_trait::async_trait;

use super::errors::StorageResult;
use super::record::{Record, RecordId};
use crate::query::{IncludeSet, ReadQuery, WhereClause};

/// Capabilities the engine needs from a backend.
///
/// Entities are addressed by name (`Article`), join tables by table name.
/// Implementations own `id`, `created_at` and `updated_at`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Filtered, ordered, optionally windowed read
    async fn find(&self, entity: &str, query: &ReadQuery) -> StorageResult<Vec<Record>>;

    /// Rows matching `filter`, ignoring any window
    async fn count(&self, entity: &str, filter: &WhereClause) -> StorageResult<u64>;

    async fn find_by_id(
        &self,
        entity: &str,
        id: RecordId,
        includes: &IncludeSet,
    ) -> StorageResult<Option<Record>>;

    /// First row matching `filter` in id order
    async fn find_first(&self, entity: &str, filter: &WhereClause) -> StorageResult<Option<Record>>;

    async fn exists(&self, entity: &str, filter: &WhereClause) -> StorageResult<bool> {
        Ok(self.find_first(entity, filter).await?.is_some())
    }

    /// Inserts a new row, assigning id and timestamps
    async fn insert(&self, entity: &str, record: Record) -> StorageResult<Record>;

    /// Replaces the stored columns of row `id`, refreshing `updated_at`
    async fn update(&self, entity: &str, id: RecordId, record: Record) -> StorageResult<Record>;

    /// Returns whether a row was removed
    async fn delete(&self, entity: &str, id: RecordId) -> StorageResult<bool>;

    /// Links two rows through a many-to-many relation. Returns `false` if
    /// they were already linked.
    async fn attach(
        &self,
        entity: &str,
        relation: &str,
        owner: RecordId,
        related: RecordId,
    ) -> StorageResult<bool>;

    /// Returns `false` if the rows were not linked
    async fn detach(
        &self,
        entity: &str,
        relation: &str,
        owner: RecordId,
        related: RecordId,
    ) -> StorageResult<bool>;

    /// Loads rows as given, keeping ids and timestamps. `table` may be an
    /// entity table or a join table.
    async fn import(&self, table: &str, rows: Vec<Record>) -> StorageResult<usize>;

    /// Further calls fail with `Unavailable`
    async fn close(&self) -> StorageResult<()>;

    fn is_open(&self) -> bool;
}
