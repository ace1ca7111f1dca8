//! Concrete entities of the admin API
//!
//! | entity  | table      | includes                |
//! |---------|------------|-------------------------|
//! | Article | `articles` | `user`, `content`, `tags` |
//! | User    | `users`    | `articles`              |
//! | Tag     | `tags`     | `articles`              |
//! | Content | `contents` | `article`               |
//! | Admin   | `admins`   |                         |
//!
//! Articles and tags are linked through the `articles_tags` join table.

mod account;
mod article;
mod content;
mod tag;

pub use account::{Admin, User, PASSWORD_FIELD};
pub use article::{Article, ARTICLE_STATUSES};
pub use content::Content;
pub use tag::Tag;

use crate::schema::EntityRegistry;
use crate::service::Entity;

pub const ARTICLES_TAGS_TABLE: &str = "articles_tags";

/// Registry of every entity above
pub fn standard_registry() -> EntityRegistry {
    EntityRegistry::new()
        .with(User::definition())
        .with(Admin::definition())
        .with(Article::definition())
        .with(Content::definition())
        .with(Tag::definition())
}
