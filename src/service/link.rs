//! Many-to-many links
//!
//! Attaches and detaches rows of a related entity through a declared
//! many-to-many relation of `E`, e.g. tags on an article.

use std::marker::PhantomData;

use tracing::debug;

use super::entity::{decode, Entity};
use super::errors::{EngineError, EngineResult};
use crate::query::IncludeSet;
use crate::schema::{EntityDef, RelationDef, RelationKind};
use crate::storage::{Connection, RecordId};
use crate::validation::{ValidationError, ValidationErrors};

pub struct LinkService<E: Entity> {
    conn: Connection,
    def: EntityDef,
    relation: RelationDef,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> LinkService<E> {
    /// # Errors
    ///
    /// `InvalidQuery` unless `relation` is a many-to-many relation of `E`.
    pub fn new(conn: Connection, relation: &str) -> EngineResult<Self> {
        let def = E::definition();
        let relation = match def.relation_def(relation) {
            Some(rel) if matches!(rel.kind, RelationKind::ManyToMany { .. }) => rel.clone(),
            _ => {
                return Err(EngineError::InvalidQuery(format!(
                    "{} has no many-to-many relation '{}'",
                    def.name, relation
                )))
            }
        };
        Ok(Self {
            conn,
            def,
            relation,
            _entity: PhantomData,
        })
    }

    pub fn relation(&self) -> &RelationDef {
        &self.relation
    }

    /// Links `related` to `owner`. Linking an already linked pair changes
    /// nothing. Returns the owner with the relation included.
    pub async fn attach(&self, owner: RecordId, related: RecordId) -> EngineResult<E> {
        self.check_sides(owner, related).await?;
        let created = self
            .conn
            .attach(&self.def.name, &self.relation.name, owner, related)
            .await?;
        debug!(entity = %self.def.name, relation = %self.relation.name, owner, related, created, "attach");
        self.owner_with_relation(owner).await
    }

    /// Unlinks `related` from `owner`. Unlinking a pair that is not linked
    /// changes nothing.
    pub async fn detach(&self, owner: RecordId, related: RecordId) -> EngineResult<E> {
        self.check_sides(owner, related).await?;
        let removed = self
            .conn
            .detach(&self.def.name, &self.relation.name, owner, related)
            .await?;
        debug!(entity = %self.def.name, relation = %self.relation.name, owner, related, removed, "detach");
        self.owner_with_relation(owner).await
    }

    /// The owner is checked first; a missing owner skips the related check.
    async fn check_sides(&self, owner: RecordId, related: RecordId) -> EngineResult<()> {
        let (owner_key, related_key) = match &self.relation.kind {
            RelationKind::ManyToMany {
                owner_key,
                related_key,
                ..
            } => (owner_key.as_str(), related_key.as_str()),
            _ => ("id", "id"),
        };

        let none = IncludeSet::new();
        if self.conn.find_by_id(&self.def.name, owner, &none).await?.is_none() {
            return Err(missing(owner_key, &self.def.name));
        }
        if self
            .conn
            .find_by_id(&self.relation.entity, related, &none)
            .await?
            .is_none()
        {
            return Err(missing(related_key, &self.relation.entity));
        }
        Ok(())
    }

    async fn owner_with_relation(&self, owner: RecordId) -> EngineResult<E> {
        let includes: IncludeSet = std::iter::once(self.relation.name.as_str()).collect();
        match self.conn.find_by_id(&self.def.name, owner, &includes).await? {
            Some(record) => decode(record),
            None => Err(EngineError::NotFound),
        }
    }
}

fn missing(field: &str, entity: &str) -> EngineError {
    EngineError::ValidationFailed(ValidationErrors::from(ValidationError::new(
        field,
        format!("{} with given id must be exists", entity),
    )))
}
