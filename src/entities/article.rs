use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Content, Tag, User};
use crate::schema::{EntityDef, FieldDef, RelationDef};
use crate::service::Entity;
use crate::storage::RecordId;

pub const ARTICLE_STATUSES: [&str; 2] = ["published", "draft"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: RecordId,
    pub user_id: RecordId,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Box<Content>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl Entity for Article {
    fn definition() -> EntityDef {
        EntityDef::new("Article", "articles")
            .field(FieldDef::integer("user_id").required().positive().exists_in("User"))
            .field(FieldDef::string("title").required().max_length(100))
            .field(FieldDef::string("description").required().max_length(500))
            .field(FieldDef::string("status").required().one_of(ARTICLE_STATUSES))
            .relation(RelationDef::belongs_to("user", "User", "user_id"))
            .relation(RelationDef::has_one("content", "Content", "article_id"))
            .relation(RelationDef::many_to_many(
                "tags",
                "Tag",
                "articles_tags",
                "article_id",
                "tag_id",
            ))
    }
}
