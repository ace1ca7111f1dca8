//! Entity registry
//!
//! Holds every [`EntityDef`] a storage backend and the services know about.
//! Lookups go by entity name (`Article`) or by table name (`articles`).

use std::collections::BTreeSet;

use super::entity::EntityDef;

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<EntityDef>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition, replacing one with the same name
    pub fn register(&mut self, def: EntityDef) {
        match self.entities.iter_mut().find(|e| e.name == def.name) {
            Some(existing) => *existing = def,
            None => self.entities.push(def),
        }
    }

    pub fn with(mut self, def: EntityDef) -> Self {
        self.register(def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn by_table(&self, table: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.table == table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every join table named by a many-to-many relation
    pub fn join_tables(&self) -> BTreeSet<&str> {
        self.entities
            .iter()
            .flat_map(|e| e.relations.iter())
            .filter_map(|r| r.join_table())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, RelationDef};

    #[test]
    fn test_lookup_by_name_and_table() {
        let registry = EntityRegistry::new()
            .with(EntityDef::new("Tag", "tags").field(FieldDef::string("name")))
            .with(EntityDef::new("Article", "articles").relation(RelationDef::many_to_many(
                "tags",
                "Tag",
                "articles_tags",
                "article_id",
                "tag_id",
            )));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Tag").unwrap().table, "tags");
        assert_eq!(registry.by_table("articles").unwrap().name, "Article");
        assert!(registry.get("tags").is_none());
        assert_eq!(registry.join_tables().into_iter().collect::<Vec<_>>(), vec!["articles_tags"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = EntityRegistry::new();
        registry.register(EntityDef::new("Tag", "tags"));
        registry.register(EntityDef::new("Tag", "labels"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Tag").unwrap().table, "labels");
    }
}
