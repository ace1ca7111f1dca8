#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crudbase::entities::standard_registry;
use crudbase::seed::{SeedSet, Seeder};
use crudbase::storage::Connection;

pub const TITLES: [&str; 20] = [
    "sint repellendus inventore",
    "deserunt tempore sit",
    "et accusantium accusantium",
    "omnis id nam",
    "in fuga occaecati",
    "porro maiores non",
    "fugiat sed sequi",
    "nemo libero porro",
    "soluta placeat mollitia",
    "repudiandae magnam ex",
    "facere ea odit",
    "commodi quod quis",
    "ea libero minus",
    "asperiores numquam labore",
    "adipisci ducimus occaecati",
    "magnam voluptate expedita",
    "earum neque at",
    "voluptatum necessitatibus totam",
    "fugit debitis ut",
    "saepe cupiditate exercitationem",
];

pub const USERS: usize = 10;

fn seed_document() -> Value {
    let stamp = "2023-07-01T00:00:00.000Z";
    let users: Vec<Value> = (1..=USERS)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("User {}", i),
                "username": format!("user{}", i),
                "password": format!("password{}", i),
                "email": format!("user{}@example.com", i),
                "created_at": stamp,
                "updated_at": stamp,
            })
        })
        .collect();
    let articles: Vec<Value> = TITLES
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({
                "id": i + 1,
                "user_id": i / 2 + 1,
                "title": title,
                "description": format!("Description of {}", title),
                "status": if i % 4 == 0 { "draft" } else { "published" },
                "created_at": stamp,
                "updated_at": stamp,
            })
        })
        .collect();
    json!({
        "users": users,
        "articles": articles,
        "contents": [
            {"id": 1, "article_id": 1, "body": "First body"},
            {"id": 2, "article_id": 2, "body": "Second body"}
        ],
        "tags": [
            {"id": 1, "name": "rust"},
            {"id": 2, "name": "databases"},
            {"id": 3, "name": "testing"}
        ],
        "articles_tags": [
            {"article_id": 1, "tag_id": 1},
            {"article_id": 1, "tag_id": 2},
            {"article_id": 2, "tag_id": 1}
        ],
        "admins": [
            {"id": 1, "name": "Root", "username": "root", "password": "rootpass", "email": "root@example.com"}
        ]
    })
}

/// Memory storage over the standard entities, seeded with 20 articles
pub async fn seeded() -> Connection {
    let conn = Connection::open_memory(Arc::new(standard_registry()));
    let seeds = SeedSet::parse(&seed_document().to_string()).unwrap();
    Seeder::new(conn.clone())
        .hash_credentials(false)
        .run(seeds)
        .await
        .unwrap();
    conn
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}
