//! Users and admins
//!
//! Both carry a `password` credential that is stored hashed and never
//! serialized back out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Article;
use crate::schema::{EntityDef, FieldDef, RelationDef};
use crate::service::Entity;
use crate::storage::RecordId;

pub const PASSWORD_FIELD: &str = "password";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articles: Option<Vec<Article>>,
}

impl Entity for User {
    fn definition() -> EntityDef {
        account_fields(EntityDef::new("User", "users"))
            .relation(RelationDef::has_many("articles", "Article", "user_id"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: RecordId,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Admin {
    fn definition() -> EntityDef {
        account_fields(EntityDef::new("Admin", "admins"))
    }
}

fn account_fields(def: EntityDef) -> EntityDef {
    def.field(FieldDef::string("name").required().max_length(100))
        .field(FieldDef::string("username").required().max_length(100).unique())
        .field(
            FieldDef::string(PASSWORD_FIELD)
                .required()
                .min_length(6)
                .max_length(50),
        )
        .field(
            FieldDef::string("email")
                .required()
                .max_length(100)
                .email()
                .unique(),
        )
        .credential(PASSWORD_FIELD)
}
