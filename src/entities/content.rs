use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Article;
use crate::schema::{EntityDef, FieldDef, RelationDef};
use crate::service::Entity;
use crate::storage::RecordId;

/// Body of an article, at most one per article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: RecordId,
    pub article_id: RecordId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<Box<Article>>,
}

impl Entity for Content {
    fn definition() -> EntityDef {
        EntityDef::new("Content", "contents")
            .field(
                FieldDef::integer("article_id")
                    .required()
                    .positive()
                    .exists_in("Article")
                    .unique(),
            )
            .field(FieldDef::string("body").required())
            .relation(RelationDef::belongs_to("article", "Article", "article_id"))
    }
}
