use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Article;
use crate::schema::{EntityDef, FieldDef, RelationDef};
use crate::service::Entity;
use crate::storage::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: RecordId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<Article>>,
}

impl Entity for Tag {
    fn definition() -> EntityDef {
        EntityDef::new("Tag", "tags")
            .field(FieldDef::string("name").required().max_length(100))
            .relation(RelationDef::many_to_many(
                "articles",
                "Article",
                "articles_tags",
                "tag_id",
                "article_id",
            ))
    }
}
