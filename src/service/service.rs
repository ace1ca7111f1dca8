//! Generic entity service
//!
//! One [`EntityService`] per entity type. Reads compile the boundary query
//! into a [`ReadQuery`]; writes run the merge, validate and persist pipeline.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::credential::hash_credential;
use super::entity::{decode, Entity};
use super::errors::{EngineError, EngineResult};
use super::pipeline::{blank, merge, PersistPhase, PhaseTracker};
use crate::query::{
    FilterCompiler, FilterSet, FindAllQuery, FindOneQuery, FindQuery, PageRequest, PageResult, ReadQuery,
    SortCompiler, WhereClause, DEFAULT_PAGE_SIZE,
};
use crate::schema::EntityDef;
use crate::storage::{Connection, Record, RecordId, StorageError};
use crate::validation::{RecordValidator, ValidationScope};

/// Result envelope of [`EntityService::find`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "E: Entity"))]
pub struct FindResponse<E> {
    pub data: Vec<E>,
    pub pagination: PageResult,
}

pub struct EntityService<E: Entity> {
    conn: Connection,
    def: EntityDef,
    validator: RecordValidator,
    compiler: FilterCompiler,
    default_page_size: u64,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityService<E> {
    pub fn new(conn: Connection) -> Self {
        let def = E::definition();
        let compiler = FilterCompiler::new(def.queryable_fields());
        Self {
            validator: RecordValidator::new(conn.clone()),
            conn,
            def,
            compiler,
            default_page_size: DEFAULT_PAGE_SIZE,
            _entity: PhantomData,
        }
    }

    /// Page size used when a query omits `pageSize`
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn definition(&self) -> &EntityDef {
        &self.def
    }

    /// One page of matching rows plus pagination metadata.
    ///
    /// The page read and the count run concurrently; either failing fails
    /// the call.
    pub async fn find(&self, query: &FindQuery) -> EngineResult<FindResponse<E>> {
        let page =
            PageRequest::with_default_size(query.page, query.page_size, self.default_page_size)?;
        let filter = self.compile_filter(query.filters.as_ref())?;
        let read = ReadQuery::new(filter.clone())
            .order_by(SortCompiler::compile(query.sorts.as_ref()))
            .paged(&page)
            .include(query.includes.clone().unwrap_or_default());
        debug!(entity = %self.def.name, query = %read, "find");

        let entity = self.def.name.as_str();
        let (rows, row_count) = tokio::try_join!(
            self.conn.find(entity, &read),
            self.conn.count(entity, &filter)
        )?;

        Ok(FindResponse {
            data: decode_all(rows)?,
            pagination: PageResult::compute(&page, row_count),
        })
    }

    /// Every matching row in order, no window
    pub async fn find_all(&self, query: &FindAllQuery) -> EngineResult<Vec<E>> {
        let filter = self.compile_filter(query.filters.as_ref())?;
        let read = ReadQuery::new(filter)
            .order_by(SortCompiler::compile(query.sorts.as_ref()))
            .include(query.includes.clone().unwrap_or_default());
        debug!(entity = %self.def.name, query = %read, "find all");

        let rows = self.conn.find(&self.def.name, &read).await?;
        decode_all(rows)
    }

    pub async fn find_one(&self, id: RecordId, query: &FindOneQuery) -> EngineResult<E> {
        let includes = query.includes.clone().unwrap_or_default();
        match self.conn.find_by_id(&self.def.name, id, &includes).await? {
            Some(record) => decode(record),
            None => Err(EngineError::NotFound),
        }
    }

    /// Validates every declared field, then inserts
    pub async fn create(&self, input: &Map<String, Value>) -> EngineResult<E> {
        let mut phase = PhaseTracker::start(&self.def.name, "create");
        let mut record = blank(&self.def);
        merge(&self.def, &mut record, input);

        self.check(&mut phase, &record, &ValidationScope::All).await?;

        phase.enter(PersistPhase::Persisting);
        hash_credential(&self.def, &mut record, None)?;
        let stored = self.conn.insert(&self.def.name, record).await?;
        phase.enter(PersistPhase::Committed);
        decode(stored)
    }

    /// Merges `input` onto row `id`. Only fields present in `input` run
    /// their field rules; relational rules see the merged row.
    pub async fn update(&self, id: RecordId, input: &Map<String, Value>) -> EngineResult<E> {
        let persisted = self.load(id).await?;
        let mut phase = PhaseTracker::start(&self.def.name, "update");
        let mut record = persisted.clone();
        let present = merge(&self.def, &mut record, input);

        self.check(&mut phase, &record, &ValidationScope::Only(present))
            .await?;

        phase.enter(PersistPhase::Persisting);
        hash_credential(&self.def, &mut record, Some(&persisted))?;
        let stored = self
            .conn
            .update(&self.def.name, id, record)
            .await
            .map_err(not_found)?;
        phase.enter(PersistPhase::Committed);
        decode(stored)
    }

    pub async fn remove(&self, id: RecordId) -> EngineResult<()> {
        self.load(id).await?;
        if !self.conn.delete(&self.def.name, id).await? {
            return Err(EngineError::NotFound);
        }
        debug!(entity = %self.def.name, id, "removed");
        Ok(())
    }

    async fn load(&self, id: RecordId) -> EngineResult<Record> {
        self.conn
            .find_by_id(&self.def.name, id, &Default::default())
            .await?
            .ok_or(EngineError::NotFound)
    }

    async fn check(
        &self,
        phase: &mut PhaseTracker<'_>,
        record: &Record,
        scope: &ValidationScope,
    ) -> EngineResult<()> {
        phase.enter(PersistPhase::Validating);
        let errors = self.validator.validate(&self.def, record, scope).await?;
        if errors.is_empty() {
            return Ok(());
        }
        phase.enter(PersistPhase::Aborted);
        info!(entity = %self.def.name, errors = errors.len(), "write rejected by validation");
        Err(EngineError::ValidationFailed(errors))
    }

    fn compile_filter(&self, filters: Option<&FilterSet>) -> EngineResult<WhereClause> {
        match filters {
            Some(filters) => Ok(self.compiler.compile(filters)?),
            None => Ok(WhereClause::new()),
        }
    }
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            def: self.def.clone(),
            validator: self.validator.clone(),
            compiler: self.compiler.clone(),
            default_page_size: self.default_page_size,
            _entity: PhantomData,
        }
    }
}

fn decode_all<E: Entity>(rows: Vec<Record>) -> EngineResult<Vec<E>> {
    rows.into_iter().map(decode).collect()
}

fn not_found(err: StorageError) -> EngineError {
    match err {
        StorageError::NotFound { .. } => EngineError::NotFound,
        other => other.into(),
    }
}
