//! Entity definitions
//!
//! An [`EntityDef`] lists the writable fields of one table, their input
//! rules, the relations that can be included on read, and which field (if
//! any) holds a credential that is hashed before it is written.

use super::types::{ExistenceMode, FieldKind, FieldRule, RelationalRule};
use crate::storage::{CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

/// Writable field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Input rules, checked in declaration order
    pub rules: Vec<FieldRule>,
    /// Rules that read storage
    pub relational: Vec<RelationalRule>,
    /// Whether callers may filter and sort on this field
    pub queryable: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rules: Vec::new(),
            relational: Vec::new(),
            queryable: true,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn required(self) -> Self {
        self.rule(FieldRule::Required)
    }

    pub fn max_length(self, max: usize) -> Self {
        self.rule(FieldRule::MaxLength(max))
    }

    pub fn min_length(self, min: usize) -> Self {
        self.rule(FieldRule::MinLength(min))
    }

    pub fn email(self) -> Self {
        self.rule(FieldRule::Email)
    }

    pub fn one_of<I, S>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule(FieldRule::OneOf(allowed.into_iter().map(Into::into).collect()))
    }

    pub fn positive(self) -> Self {
        self.rule(FieldRule::Positive)
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Value must not repeat across rows
    pub fn unique(self) -> Self {
        self.unique_with(Vec::<String>::new())
    }

    /// Value combined with `companions` must not repeat across rows
    pub fn unique_with<I, S>(mut self, companions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relational.push(RelationalRule::Unique {
            companions: companions.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Value must reference at least one row of `entity`
    pub fn exists_in(self, entity: impl Into<String>) -> Self {
        self.exists_in_mode(entity, ExistenceMode::Any)
    }

    pub fn exists_in_mode(mut self, entity: impl Into<String>, mode: ExistenceMode) -> Self {
        self.relational.push(RelationalRule::ExistsIn {
            entity: entity.into(),
            mode,
        });
        self
    }

    /// Hide from filters and sorts
    pub fn internal(mut self) -> Self {
        self.queryable = false;
        self
    }

    pub fn is_required(&self) -> bool {
        self.rules.contains(&FieldRule::Required)
    }
}

/// How a relation is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// This row's `foreign_key` holds the related id
    BelongsTo { foreign_key: String },
    /// One related row holds this row's id in `foreign_key`
    HasOne { foreign_key: String },
    /// Related rows hold this row's id in `foreign_key`
    HasMany { foreign_key: String },
    /// Pairs in `join_table`: `owner_key` is this side, `related_key` the other
    ManyToMany {
        join_table: String,
        owner_key: String,
        related_key: String,
    },
}

/// A relation that can be included on read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    /// Key the related data is attached under
    pub name: String,
    /// Related entity name
    pub entity: String,
    pub kind: RelationKind,
}

impl RelationDef {
    pub fn belongs_to(
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            kind: RelationKind::BelongsTo {
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn has_one(
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            kind: RelationKind::HasOne {
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn has_many(
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            kind: RelationKind::HasMany {
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn many_to_many(
        name: impl Into<String>,
        entity: impl Into<String>,
        join_table: impl Into<String>,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            kind: RelationKind::ManyToMany {
                join_table: join_table.into(),
                owner_key: owner_key.into(),
                related_key: related_key.into(),
            },
        }
    }

    /// Join table, for many-to-many relations
    pub fn join_table(&self) -> Option<&str> {
        match &self.kind {
            RelationKind::ManyToMany { join_table, .. } => Some(join_table),
            _ => None,
        }
    }
}

/// One entity: name, table, fields, relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDef {
    /// Entity name, e.g. `Article`
    pub name: String,
    /// Table name, e.g. `articles`
    pub table: String,
    pub fields: Vec<FieldDef>,
    pub relations: Vec<RelationDef>,
    /// Field hashed before it is written
    pub credential: Option<String>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
            relations: Vec::new(),
            credential: None,
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Marks a declared field as the credential; it also stops being queryable
    pub fn credential(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if let Some(def) = self.fields.iter_mut().find(|f| f.name == field) {
            def.queryable = false;
        }
        self.credential = Some(field);
        self
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation_def(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Storage-owned or declared column
    pub fn has_column(&self, name: &str) -> bool {
        Self::storage_kind(name).is_some() || self.field_def(name).is_some()
    }

    /// Kind of a filterable/sortable column
    pub fn queryable_kind(&self, name: &str) -> Option<FieldKind> {
        Self::storage_kind(name).or_else(|| {
            self.field_def(name)
                .filter(|f| f.queryable)
                .map(|f| f.kind)
        })
    }

    /// Filterable/sortable columns, storage-owned first
    pub fn queryable_fields(&self) -> impl Iterator<Item = &str> {
        [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD].into_iter().chain(
            self.fields
                .iter()
                .filter(|f| f.queryable)
                .map(|f| f.name.as_str()),
        )
    }

    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.iter().map(|r| r.name.as_str())
    }

    pub fn is_credential(&self, field: &str) -> bool {
        self.credential.as_deref() == Some(field)
    }

    fn storage_kind(name: &str) -> Option<FieldKind> {
        match name {
            ID_FIELD => Some(FieldKind::Integer),
            CREATED_AT_FIELD | UPDATED_AT_FIELD => Some(FieldKind::Date),
            _ => None,
        }
    }
}
