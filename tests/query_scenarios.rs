//! Read-path scenarios against a seeded memory storage

mod common;

use serde_json::{json, Value};

use common::{seeded, TITLES};
use crudbase::entities::{Article, User};
use crudbase::query::{FindAllQuery, FindOneQuery, FindQuery};
use crudbase::schema::QueryPolicy;
use crudbase::service::{EngineError, Entity, EntityService};
use crudbase::storage::StorageError;

fn query(value: Value) -> FindQuery {
    serde_json::from_value(value).unwrap()
}

fn ids(articles: &[Article]) -> Vec<u64> {
    articles.iter().map(|a| a.id).collect()
}

async fn articles() -> EntityService<Article> {
    EntityService::new(seeded().await)
}

#[tokio::test]
async fn test_pagination_over_twenty_rows() {
    let svc = articles().await;

    let first = svc.find(&query(json!({"page": 1, "pageSize": 10}))).await.unwrap();
    assert_eq!(ids(&first.data), (1..=10).collect::<Vec<_>>());
    assert_eq!(first.pagination.page_count, 2);
    assert_eq!(first.pagination.row_count, 20);

    let second = svc.find(&query(json!({"page": 2}))).await.unwrap();
    assert_eq!(ids(&second.data), (11..=20).collect::<Vec<_>>());

    let beyond = svc.find(&query(json!({"page": 3, "pageSize": 10}))).await.unwrap();
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.pagination.page_count, 2);
    assert_eq!(beyond.pagination.page, 3);
}

#[tokio::test]
async fn test_like_and_not_like_are_complements() {
    let svc = articles().await;
    let expected: Vec<u64> = TITLES
        .iter()
        .enumerate()
        .filter(|(_, t)| t.contains('a'))
        .map(|(i, _)| i as u64 + 1)
        .collect();

    let like = svc
        .find_all(&serde_json::from_value(json!({"filters": {"title": {"$like": "a"}}})).unwrap())
        .await
        .unwrap();
    assert_eq!(ids(&like), expected);

    let not_like = svc
        .find_all(&serde_json::from_value(json!({"filters": {"title": {"$notLike": "a"}}})).unwrap())
        .await
        .unwrap();
    assert_eq!(like.len() + not_like.len(), 20);
    assert!(not_like.iter().all(|a| !a.title.contains('a')));
}

#[tokio::test]
async fn test_between_and_not_between() {
    let svc = articles().await;

    let inside = svc
        .find(&query(json!({"filters": {"id": {"$between": [8, 13]}}, "pageSize": 50})))
        .await
        .unwrap();
    assert_eq!(ids(&inside.data), vec![8, 9, 10, 11, 12, 13]);
    assert_eq!(inside.pagination.row_count, 6);

    let outside = svc
        .find(&query(json!({"filters": {"id": {"$notBetween": [8, 13]}}, "pageSize": 50})))
        .await
        .unwrap();
    assert_eq!(outside.pagination.row_count, 14);
    assert!(ids(&outside.data).iter().all(|id| !(8..=13).contains(id)));
}

#[tokio::test]
async fn test_last_operator_wins() {
    let svc = articles().await;
    let both = svc
        .find(&query(json!({"filters": {"id": {"$gte": 17, "$lte": 4}}})))
        .await
        .unwrap();
    let last_only = svc
        .find(&query(json!({"filters": {"id": {"$lte": 4}}})))
        .await
        .unwrap();
    assert_eq!(both, last_only);
    assert_eq!(ids(&both.data), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_find_is_idempotent() {
    let svc = articles().await;
    let q = query(json!({
        "filters": {"status": {"$eq": "published"}},
        "sorts": {"user_id": "desc", "id": "asc"},
        "page": 2,
        "pageSize": 4
    }));
    let a = svc.find(&q).await.unwrap();
    let b = svc.find(&q).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.pagination.row_count, 15);
}

#[tokio::test]
async fn test_sort_order() {
    let svc = articles().await;
    let q: FindAllQuery = serde_json::from_value(json!({
        "filters": {"user_id": {"$in": [1, 2]}},
        "sorts": {"user_id": "desc", "id": "desc"}
    }))
    .unwrap();
    assert_eq!(ids(&svc.find_all(&q).await.unwrap()), vec![4, 3, 2, 1]);
}

#[tokio::test]
async fn test_empty_operand_is_ignored() {
    let svc = articles().await;
    let page = svc
        .find(&query(json!({"filters": {"title": {"$like": ""}, "id": {"$in": []}}})))
        .await
        .unwrap();
    assert_eq!(page.pagination.row_count, 20);
}

#[tokio::test]
async fn test_unknown_operator_names_field() {
    let svc = articles().await;
    let err = svc
        .find(&query(json!({"filters": {"title": {"$regex": "^s"}}})))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidOperator {
            field: "title".to_string(),
            token: "$regex".to_string(),
        }
    );
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_unknown_sort_field_reaches_storage() {
    let svc = articles().await;
    let err = svc
        .find(&query(json!({"sorts": {"rating": "desc"}})))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Storage(StorageError::UnknownField { ref field, .. }) if field == "rating"
    ));
}

#[tokio::test]
async fn test_zero_operand_filters_rows() {
    let svc = articles().await;

    let all = svc
        .find(&query(json!({"filters": {"user_id": {"$gt": 0}}})))
        .await
        .unwrap();
    assert_eq!(all.pagination.row_count, 20);

    let none = svc
        .find(&query(json!({"filters": {"user_id": {"$eq": 0}}})))
        .await
        .unwrap();
    assert_eq!(none.pagination.row_count, 0);
    assert!(none.data.is_empty());
}

#[tokio::test]
async fn test_credential_is_not_sortable() {
    let users = EntityService::<User>::new(seeded().await);
    let err = users
        .find(&query(json!({"sorts": {"password": "asc"}})))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Storage(StorageError::UnknownField { ref field, .. }) if field == "password"
    ));

    let by_username = users
        .find(&query(json!({"sorts": {"username": "desc"}})))
        .await
        .unwrap();
    assert_eq!(by_username.pagination.row_count, 10);
}

#[tokio::test]
async fn test_includes() {
    let svc = articles().await;
    let article = svc
        .find_one(
            1,
            &serde_json::from_value::<FindOneQuery>(json!({"includes": ["user", "content", "tags"]}))
                .unwrap(),
        )
        .await
        .unwrap();

    let user = article.user.unwrap();
    assert_eq!(user.id, 1);
    assert!(user.password.is_none());
    assert_eq!(article.content.unwrap().body, "First body");
    let tags: Vec<_> = article.tags.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(tags, vec!["rust", "databases"]);

    let plain = svc.find_one(1, &FindOneQuery::default()).await.unwrap();
    assert!(plain.user.is_none() && plain.tags.is_none());
}

#[tokio::test]
async fn test_find_one_missing() {
    let svc = articles().await;
    let err = svc.find_one(99, &FindOneQuery::default()).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound);
    assert_eq!(err.to_string(), "Not Found");
}

#[tokio::test]
async fn test_policy_rejects_before_engine() {
    let def = Article::definition();
    let policy = QueryPolicy::new(&def);

    let errors = policy
        .check_find(&query(json!({
            "filters": {"title": {"$gt": "a"}, "rating": {"$eq": 1}},
            "includes": ["comments"]
        })))
        .unwrap_err();
    let messages = errors.messages();
    assert!(messages.contains(&"filters.property rating should not exist"));
    assert!(messages.contains(&"filters.title.property $gt should not exist"));
    assert!(messages
        .contains(&"each value in includes must be one of the following values: user, content, tags"));

    assert!(policy
        .check_find(&query(json!({"filters": {"title": {"$like": "a"}}, "sorts": {"id": "desc"}})))
        .is_ok());
}
