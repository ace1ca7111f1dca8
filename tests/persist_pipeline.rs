//! Write-path scenarios: create, update, remove and links

mod common;

use serde_json::{json, Value};

use common::{object, seeded};
use crudbase::entities::{Admin, Article, Content, Tag, User};
use crudbase::query::{FindOneQuery, IncludeSet};
use crudbase::service::{to_input, verify_password, EngineError, EntityService, LinkService};

fn messages(err: &EngineError) -> Vec<String> {
    err.validation_errors()
        .map(|e| e.messages().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_create_round_trip() {
    let svc = EntityService::<Article>::new(seeded().await);
    let input = object(json!({
        "user_id": 3,
        "title": "fresh article",
        "description": "about something",
        "status": "draft"
    }));
    let created = svc.create(&input).await.unwrap();
    assert_eq!(created.id, 21);
    assert_eq!(created.created_at, created.updated_at);

    let found = svc.find_one(21, &FindOneQuery::default()).await.unwrap();
    assert_eq!(found, created);
    assert_eq!(found.title, "fresh article");
    assert_eq!(found.user_id, 3);
}

#[tokio::test]
async fn test_create_ignores_storage_owned_and_unknown_keys() {
    let svc = EntityService::<Tag>::new(seeded().await);
    let created = svc
        .create(&object(json!({"id": 500, "name": "async", "colour": "red", "created_at": "1999-01-01T00:00:00Z"})))
        .await
        .unwrap();
    assert_eq!(created.id, 4);
    assert_ne!(created.created_at.to_rfc3339(), "1999-01-01T00:00:00+00:00");
}

#[tokio::test]
async fn test_validation_reports_every_failure_in_field_order() {
    let svc = EntityService::<Article>::new(seeded().await);
    let err = svc
        .create(&object(json!({
            "user_id": 404,
            "title": "x".repeat(101),
            "status": "archived"
        })))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(
        messages(&err),
        vec![
            "user_id field must contain id of existing User",
            "title must be shorter than or equal to 100 characters",
            "description should not be empty",
            "status must be one of the following values: published, draft",
        ]
    );

    let count = svc.find(&Default::default()).await.unwrap().pagination.row_count;
    assert_eq!(count, 20);
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let svc = EntityService::<Article>::new(seeded().await);
    let before = svc.find_one(5, &FindOneQuery::default()).await.unwrap();
    let updated = svc
        .update(5, &object(json!({"status": "draft"})))
        .await
        .unwrap();

    assert_eq!(updated.status, "draft");
    assert_eq!(updated.title, before.title);
    assert_eq!(updated.user_id, before.user_id);
    assert_eq!(updated.created_at, before.created_at);
    assert!(updated.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_update_only_checks_present_fields() {
    let conn = seeded().await;
    conn.import(
        "articles",
        vec![serde_json::from_value(json!({
            "id": 30, "user_id": 1, "title": "y".repeat(150), "description": "d", "status": "draft"
        }))
        .unwrap()],
    )
    .await
    .unwrap();

    let svc = EntityService::<Article>::new(conn);
    let updated = svc.update(30, &object(json!({"status": "published"}))).await;
    assert!(updated.is_ok());

    let err = svc
        .update(30, &object(json!({"title": "z".repeat(120)})))
        .await
        .unwrap_err();
    assert_eq!(
        messages(&err),
        vec!["title must be shorter than or equal to 100 characters"]
    );
}

#[tokio::test]
async fn test_update_and_remove_missing() {
    let svc = EntityService::<Tag>::new(seeded().await);
    assert_eq!(
        svc.update(99, &object(json!({"name": "x"}))).await.unwrap_err(),
        EngineError::NotFound
    );
    assert_eq!(svc.remove(99).await.unwrap_err(), EngineError::NotFound);
}

#[tokio::test]
async fn test_remove() {
    let conn = seeded().await;
    let svc = EntityService::<Tag>::new(conn.clone());
    svc.remove(1).await.unwrap();
    assert_eq!(
        svc.find_one(1, &FindOneQuery::default()).await.unwrap_err(),
        EngineError::NotFound
    );

    let articles = EntityService::<Article>::new(conn);
    let article = articles
        .find_one(1, &serde_json::from_value(json!({"includes": ["tags"]})).unwrap())
        .await
        .unwrap();
    let names: Vec<_> = article.tags.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["databases"]);
}

#[tokio::test]
async fn test_unique_fields() {
    let svc = EntityService::<User>::new(seeded().await);
    let err = svc
        .create(&object(json!({
            "name": "Clone",
            "username": "user1",
            "password": "secret99",
            "email": "user2@example.com"
        })))
        .await
        .unwrap_err();
    assert_eq!(
        messages(&err),
        vec!["username field must be unique", "email field must be unique"]
    );
}

#[tokio::test]
async fn test_self_collision_is_not_a_conflict() {
    let svc = EntityService::<User>::new(seeded().await);
    let updated = svc
        .update(1, &object(json!({"username": "user1", "name": "Renamed"})))
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");

    let err = svc
        .update(1, &object(json!({"username": "user2"})))
        .await
        .unwrap_err();
    assert_eq!(messages(&err), vec!["username field must be unique"]);
}

#[tokio::test]
async fn test_one_content_per_article() {
    let svc = EntityService::<Content>::new(seeded().await);
    let err = svc
        .create(&object(json!({"article_id": 1, "body": "another"})))
        .await
        .unwrap_err();
    assert_eq!(messages(&err), vec!["article_id field must be unique"]);

    let created = svc
        .create(&object(json!({"article_id": 3, "body": "third"})))
        .await
        .unwrap();
    assert_eq!(created.article_id, 3);

    let err = svc
        .create(&object(json!({"article_id": 77, "body": "orphan"})))
        .await
        .unwrap_err();
    assert_eq!(
        messages(&err),
        vec!["article_id field must contain id of existing Article"]
    );
}

#[tokio::test]
async fn test_credentials_are_hashed() {
    let conn = seeded().await;
    let svc = EntityService::<Admin>::new(conn.clone());
    let admin = svc
        .create(&object(json!({
            "name": "Ops",
            "username": "ops",
            "password": "hunter22",
            "email": "ops@example.com"
        })))
        .await
        .unwrap();

    let stored = conn
        .find_by_id("Admin", admin.id, &IncludeSet::new())
        .await
        .unwrap()
        .unwrap();
    let hash = stored.get("password").and_then(Value::as_str).unwrap().to_string();
    assert!(verify_password("hunter22", &hash).unwrap());

    svc.update(admin.id, &object(json!({"name": "Ops team"})))
        .await
        .unwrap();
    let unchanged = conn
        .find_by_id("Admin", admin.id, &IncludeSet::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.get("password").and_then(Value::as_str), Some(hash.as_str()));

    svc.update(admin.id, &object(json!({"password": "newsecret"})))
        .await
        .unwrap();
    let changed = conn
        .find_by_id("Admin", admin.id, &IncludeSet::new())
        .await
        .unwrap()
        .unwrap();
    let new_hash = changed.get("password").and_then(Value::as_str).unwrap();
    assert!(verify_password("newsecret", new_hash).unwrap());
    assert!(!verify_password("hunter22", new_hash).unwrap());
}

#[tokio::test]
async fn test_short_password_rejected() {
    let svc = EntityService::<User>::new(seeded().await);
    let err = svc
        .create(&object(json!({
            "name": "Tiny",
            "username": "tiny",
            "password": "abc",
            "email": "not-an-email"
        })))
        .await
        .unwrap_err();
    assert_eq!(
        messages(&err),
        vec![
            "password must be longer than or equal to 6 characters",
            "email must be an email",
        ]
    );
}

#[tokio::test]
async fn test_closed_storage_is_unavailable() {
    let conn = seeded().await;
    let svc = EntityService::<Tag>::new(conn.clone());
    conn.close().await.unwrap();

    let err = svc.find(&Default::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::StorageUnavailable(_)));
    assert_eq!(err.status_code(), 503);

    let err = svc
        .create(&object(json!({"name": "late"})))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StorageUnavailable(_)));
}

#[tokio::test]
async fn test_typed_input() {
    #[derive(serde::Serialize)]
    struct NewTag<'a> {
        name: &'a str,
    }

    let svc = EntityService::<Tag>::new(seeded().await);
    let tag = svc
        .create(&to_input(&NewTag { name: "typed" }).unwrap())
        .await
        .unwrap();
    assert_eq!(tag.name, "typed");
}

#[tokio::test]
async fn test_link_and_unlink_tags() {
    let links = LinkService::<Article>::new(seeded().await, "tags").unwrap();

    let article = links.attach(2, 3).await.unwrap();
    let tags: Vec<_> = article.tags.unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(tags, vec![1, 3]);

    let again = links.attach(2, 3).await.unwrap();
    assert_eq!(again.tags.unwrap().len(), 2);

    let article = links.detach(2, 1).await.unwrap();
    let tags: Vec<_> = article.tags.unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(tags, vec![3]);
}

#[tokio::test]
async fn test_link_missing_sides() {
    let links = LinkService::<Article>::new(seeded().await, "tags").unwrap();

    let err = links.attach(99, 99).await.unwrap_err();
    assert_eq!(messages(&err), vec!["Article with given id must be exists"]);

    let err = links.attach(1, 99).await.unwrap_err();
    assert_eq!(messages(&err), vec!["Tag with given id must be exists"]);
}

#[tokio::test]
async fn test_link_needs_many_to_many_relation() {
    let conn = seeded().await;
    assert!(LinkService::<Article>::new(conn.clone(), "user").is_err());
    assert!(LinkService::<Article>::new(conn, "comments").is_err());
}
