//! In-process storage backend
//!
//! Rows live in one `BTreeMap` per entity, so iteration is in id order.
//! Join tables hold one id per join column. Reads evaluate the compiled
//! [`ReadQuery`] directly: filter, then order, then window, then includes.
//!
//! Filter and sort columns are checked against the entity definition;
//! anything else is `UnknownField`, mirroring what a SQL backend reports for
//! a missing column.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::errors::{StorageError, StorageResult};
use super::record::{
    format_timestamp, Record, RecordId, CREATED_AT_FIELD, ID_FIELD, STORAGE_FIELDS,
    UPDATED_AT_FIELD,
};
use super::traits::Storage;
use crate::query::{IncludeSet, ReadQuery, RowSorter, SortKey, WhereClause};
use crate::schema::{EntityDef, EntityRegistry, RelationDef, RelationKind};

/// Join row: join column to id
type JoinRow = BTreeMap<String, RecordId>;

#[derive(Debug)]
struct Table {
    rows: BTreeMap<RecordId, Record>,
    next_id: RecordId,
}

impl Table {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn matching<'a>(&'a self, filter: &'a WhereClause) -> impl Iterator<Item = &'a Record> {
        self.rows.values().filter(move |r| filter.matches(r.as_map()))
    }
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by entity name
    tables: HashMap<String, Table>,
    /// Keyed by join table name
    joins: HashMap<String, Vec<JoinRow>>,
    /// Last timestamp handed out
    clock: Option<DateTime<Utc>>,
}

impl State {
    fn table(&self, entity: &str) -> StorageResult<&Table> {
        self.tables
            .get(entity)
            .ok_or_else(|| StorageError::UnknownEntity(entity.to_string()))
    }

    fn table_mut(&mut self, entity: &str) -> StorageResult<&mut Table> {
        self.tables
            .get_mut(entity)
            .ok_or_else(|| StorageError::UnknownEntity(entity.to_string()))
    }

    fn join(&self, table: &str) -> &[JoinRow] {
        self.joins.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Current time, never earlier than the previous stamp
    fn stamp(&mut self) -> String {
        let now = Utc::now();
        let at = match self.clock {
            Some(last) if last > now => last,
            _ => now,
        };
        self.clock = Some(at);
        format_timestamp(at)
    }
}

/// In-memory [`Storage`] implementation
pub struct MemoryStorage {
    registry: Arc<EntityRegistry>,
    state: RwLock<State>,
    open: AtomicBool,
}

impl MemoryStorage {
    /// Creates empty tables for every entity and join table in `registry`
    pub fn open(registry: Arc<EntityRegistry>) -> Self {
        let mut state = State::default();
        for def in registry.iter() {
            state.tables.insert(def.name.clone(), Table::new());
        }
        for join in registry.join_tables() {
            state.joins.insert(join.to_string(), Vec::new());
        }

        Self {
            registry,
            state: RwLock::new(state),
            open: AtomicBool::new(true),
        }
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("connection is closed".to_string()))
        }
    }

    fn def(&self, entity: &str) -> StorageResult<&EntityDef> {
        self.registry
            .get(entity)
            .ok_or_else(|| StorageError::UnknownEntity(entity.to_string()))
    }

    fn check_filter(def: &EntityDef, filter: &WhereClause) -> StorageResult<()> {
        match filter.fields().find(|f| !def.has_column(f)) {
            Some(field) => Err(StorageError::unknown_field(&def.name, field)),
            None => Ok(()),
        }
    }

    /// Sorting is limited to queryable columns; credentials are not among them
    fn check_order(def: &EntityDef, order: &[SortKey]) -> StorageResult<()> {
        match order
            .iter()
            .find(|k| def.queryable_kind(&k.field).is_none())
        {
            Some(key) => Err(StorageError::unknown_field(&def.name, &key.field)),
            None => Ok(()),
        }
    }

    fn check_includes<'d>(
        def: &'d EntityDef,
        includes: &IncludeSet,
    ) -> StorageResult<Vec<&'d RelationDef>> {
        includes
            .iter()
            .map(|name| {
                def.relation_def(name)
                    .ok_or_else(|| StorageError::unknown_relation(&def.name, name))
            })
            .collect()
    }

    fn many_to_many<'d>(
        def: &'d EntityDef,
        relation: &str,
    ) -> StorageResult<(&'d str, &'d str, &'d str, &'d str)> {
        match def.relation_def(relation) {
            Some(RelationDef {
                entity,
                kind:
                    RelationKind::ManyToMany {
                        join_table,
                        owner_key,
                        related_key,
                    },
                ..
            }) => Ok((
                entity.as_str(),
                join_table.as_str(),
                owner_key.as_str(),
                related_key.as_str(),
            )),
            _ => Err(StorageError::unknown_relation(&def.name, relation)),
        }
    }

    /// Copies declared columns of `source` onto `target`
    fn write_columns(def: &EntityDef, target: &mut Record, source: Record) -> StorageResult<()> {
        for (key, value) in source.into_map() {
            if STORAGE_FIELDS.contains(&key.as_str()) {
                continue;
            }
            if def.field_def(&key).is_none() {
                return Err(StorageError::unknown_field(&def.name, &key));
            }
            target.set(key, value);
        }
        Ok(())
    }

    /// Row as exposed through an include: no credential column
    fn related_row(&self, entity: &str, record: &Record) -> Value {
        let mut row = record.clone();
        if let Some(credential) = self.registry.get(entity).and_then(|d| d.credential.as_deref()) {
            row.remove(credential);
        }
        row.into_value()
    }

    fn attach_includes(
        &self,
        state: &State,
        record: &mut Record,
        relations: &[&RelationDef],
    ) -> StorageResult<()> {
        let Some(id) = record.id() else {
            return Ok(());
        };

        for relation in relations {
            let related = state.table(&relation.entity)?;
            let value = match &relation.kind {
                RelationKind::BelongsTo { foreign_key } => record
                    .get(foreign_key)
                    .and_then(Value::as_u64)
                    .and_then(|fk| related.rows.get(&fk))
                    .map(|r| self.related_row(&relation.entity, r))
                    .unwrap_or(Value::Null),
                RelationKind::HasOne { foreign_key } => related
                    .rows
                    .values()
                    .find(|r| r.get(foreign_key).and_then(Value::as_u64) == Some(id))
                    .map(|r| self.related_row(&relation.entity, r))
                    .unwrap_or(Value::Null),
                RelationKind::HasMany { foreign_key } => Value::Array(
                    related
                        .rows
                        .values()
                        .filter(|r| r.get(foreign_key).and_then(Value::as_u64) == Some(id))
                        .map(|r| self.related_row(&relation.entity, r))
                        .collect(),
                ),
                RelationKind::ManyToMany {
                    join_table,
                    owner_key,
                    related_key,
                } => {
                    let mut ids: Vec<RecordId> = state
                        .join(join_table)
                        .iter()
                        .filter(|row| row.get(owner_key) == Some(&id))
                        .filter_map(|row| row.get(related_key).copied())
                        .collect();
                    ids.sort_unstable();
                    ids.dedup();
                    Value::Array(
                        ids.iter()
                            .filter_map(|rid| related.rows.get(rid))
                            .map(|r| self.related_row(&relation.entity, r))
                            .collect(),
                    )
                }
            };
            record.set(relation.name.clone(), value);
        }

        Ok(())
    }

    fn import_entity_rows(
        state: &mut State,
        def: &EntityDef,
        rows: Vec<Record>,
    ) -> StorageResult<usize> {
        let count = rows.len();
        for source in rows {
            let stamp = state.stamp();
            let table = state.table_mut(&def.name)?;
            let id = source.id().unwrap_or(table.next_id);

            let mut row = Record::new();
            row.set(ID_FIELD, Value::from(id));
            for column in [CREATED_AT_FIELD, UPDATED_AT_FIELD] {
                let value = source
                    .get(column)
                    .filter(|v| !v.is_null())
                    .cloned()
                    .unwrap_or_else(|| Value::String(stamp.clone()));
                row.set(column, value);
            }
            for field in &def.fields {
                row.set(
                    field.name.clone(),
                    source.get(&field.name).cloned().unwrap_or(Value::Null),
                );
            }

            table.next_id = table.next_id.max(id + 1);
            table.rows.insert(id, row);
        }
        Ok(count)
    }

    fn import_join_rows(state: &mut State, table: &str, rows: Vec<Record>) -> StorageResult<usize> {
        let join = state.joins.entry(table.to_string()).or_default();
        let mut added = 0;
        for source in rows {
            let mut row = JoinRow::new();
            for (column, value) in source.into_map() {
                let id = value.as_u64().ok_or_else(|| StorageError::InvalidRow {
                    entity: table.to_string(),
                    reason: format!("{} must be an id", column),
                })?;
                row.insert(column, id);
            }
            if !join.contains(&row) {
                join.push(row);
                added += 1;
            }
        }
        Ok(added)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find(&self, entity: &str, query: &ReadQuery) -> StorageResult<Vec<Record>> {
        self.ensure_open()?;
        let def = self.def(entity)?;
        Self::check_filter(def, &query.filter)?;
        Self::check_order(def, &query.order)?;
        let relations = Self::check_includes(def, &query.includes)?;

        let state = self.state.read().await;
        let mut rows: Vec<Record> = state.table(entity)?.matching(&query.filter).cloned().collect();
        RowSorter::sort(&mut rows, &query.order);

        if let Some(window) = query.window {
            let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
            let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
            rows = rows.into_iter().skip(offset).take(limit).collect();
        }

        for row in rows.iter_mut() {
            self.attach_includes(&state, row, &relations)?;
        }
        Ok(rows)
    }

    async fn count(&self, entity: &str, filter: &WhereClause) -> StorageResult<u64> {
        self.ensure_open()?;
        let def = self.def(entity)?;
        Self::check_filter(def, filter)?;

        let state = self.state.read().await;
        let count = state.table(entity)?.matching(filter).count();
        Ok(count as u64)
    }

    async fn find_by_id(
        &self,
        entity: &str,
        id: RecordId,
        includes: &IncludeSet,
    ) -> StorageResult<Option<Record>> {
        self.ensure_open()?;
        let def = self.def(entity)?;
        let relations = Self::check_includes(def, includes)?;

        let state = self.state.read().await;
        let Some(mut record) = state.table(entity)?.rows.get(&id).cloned() else {
            return Ok(None);
        };
        self.attach_includes(&state, &mut record, &relations)?;
        Ok(Some(record))
    }

    async fn find_first(&self, entity: &str, filter: &WhereClause) -> StorageResult<Option<Record>> {
        self.ensure_open()?;
        let def = self.def(entity)?;
        Self::check_filter(def, filter)?;

        let state = self.state.read().await;
        let first = state.table(entity)?.matching(filter).next().cloned();
        Ok(first)
    }

    async fn insert(&self, entity: &str, record: Record) -> StorageResult<Record> {
        self.ensure_open()?;
        let def = self.def(entity)?;

        let mut row = Record::new();
        for field in &def.fields {
            row.set(field.name.clone(), Value::Null);
        }
        Self::write_columns(def, &mut row, record)?;

        let mut state = self.state.write().await;
        let stamp = state.stamp();
        let table = state.table_mut(entity)?;
        let id = table.next_id;
        table.next_id += 1;

        row.set(ID_FIELD, Value::from(id));
        row.set(CREATED_AT_FIELD, Value::String(stamp.clone()));
        row.set(UPDATED_AT_FIELD, Value::String(stamp));
        table.rows.insert(id, row.clone());

        debug!(entity, id, "row inserted");
        Ok(row)
    }

    async fn update(&self, entity: &str, id: RecordId, record: Record) -> StorageResult<Record> {
        self.ensure_open()?;
        let def = self.def(entity)?;

        let mut state = self.state.write().await;
        let stamp = state.stamp();
        let table = state.table_mut(entity)?;
        let row = table.rows.get_mut(&id).ok_or_else(|| StorageError::NotFound {
            entity: entity.to_string(),
            id,
        })?;

        let mut updated = row.clone();
        Self::write_columns(def, &mut updated, record)?;
        updated.set(UPDATED_AT_FIELD, Value::String(stamp));
        *row = updated.clone();

        debug!(entity, id, "row updated");
        Ok(updated)
    }

    async fn delete(&self, entity: &str, id: RecordId) -> StorageResult<bool> {
        self.ensure_open()?;
        let def = self.def(entity)?;

        let mut state = self.state.write().await;
        let removed = state.table_mut(entity)?.rows.remove(&id).is_some();
        if removed {
            for relation in &def.relations {
                if let RelationKind::ManyToMany {
                    join_table,
                    owner_key,
                    ..
                } = &relation.kind
                {
                    if let Some(rows) = state.joins.get_mut(join_table) {
                        rows.retain(|row| row.get(owner_key) != Some(&id));
                    }
                }
            }
            debug!(entity, id, "row deleted");
        }
        Ok(removed)
    }

    async fn attach(
        &self,
        entity: &str,
        relation: &str,
        owner: RecordId,
        related: RecordId,
    ) -> StorageResult<bool> {
        self.ensure_open()?;
        let def = self.def(entity)?;
        let (target, join_table, owner_key, related_key) = Self::many_to_many(def, relation)?;

        let mut state = self.state.write().await;
        if !state.table(entity)?.rows.contains_key(&owner) {
            return Err(StorageError::NotFound {
                entity: entity.to_string(),
                id: owner,
            });
        }
        if !state.table(target)?.rows.contains_key(&related) {
            return Err(StorageError::NotFound {
                entity: target.to_string(),
                id: related,
            });
        }

        let row: JoinRow = [(owner_key.to_string(), owner), (related_key.to_string(), related)]
            .into_iter()
            .collect();
        let join = state.joins.entry(join_table.to_string()).or_default();
        if join.contains(&row) {
            return Ok(false);
        }
        join.push(row);
        debug!(entity, relation, owner, related, "rows linked");
        Ok(true)
    }

    async fn detach(
        &self,
        entity: &str,
        relation: &str,
        owner: RecordId,
        related: RecordId,
    ) -> StorageResult<bool> {
        self.ensure_open()?;
        let def = self.def(entity)?;
        let (_, join_table, owner_key, related_key) = Self::many_to_many(def, relation)?;

        let mut state = self.state.write().await;
        let Some(join) = state.joins.get_mut(join_table) else {
            return Ok(false);
        };
        let before = join.len();
        join.retain(|row| {
            !(row.get(owner_key) == Some(&owner) && row.get(related_key) == Some(&related))
        });
        let removed = join.len() != before;
        if removed {
            debug!(entity, relation, owner, related, "rows unlinked");
        }
        Ok(removed)
    }

    async fn import(&self, table: &str, rows: Vec<Record>) -> StorageResult<usize> {
        self.ensure_open()?;
        let mut state = self.state.write().await;

        if let Some(def) = self.registry.by_table(table) {
            Self::import_entity_rows(&mut state, def, rows)
        } else if state.joins.contains_key(table) {
            Self::import_join_rows(&mut state, table, rows)
        } else {
            Err(StorageError::UnknownEntity(table.to_string()))
        }
    }

    async fn close(&self) -> StorageResult<()> {
        if self.open.swap(false, Ordering::AcqRel) {
            info!("memory storage closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
