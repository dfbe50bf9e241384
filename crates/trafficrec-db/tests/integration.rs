//! Integration tests for trafficrec-db
//!
//! Tests the capture schema with a real SQLite in-memory database

use chrono::Utc;
use trafficrec_db::entities::{header, request, response, response_cookie, run, FieldValues};
use trafficrec_db::{connect, migrate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, NotSet,
    PaginatorTrait, QueryFilter, Set,
};

/// Helper to create a migrated test database with run 1 present
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    run::ActiveModel {
        id: Set(1),
        label: Set(Some("integration".to_string())),
        start_time: Set(Some(Utc::now())),
        end_time: Set(None),
    }
    .insert(&db)
    .await
    .expect("Failed to insert run");

    db
}

fn get_request(path: &str) -> request::ActiveModel {
    request::ActiveModel {
        id: NotSet,
        run: Set(1),
        start_time: Set(Utc::now()),
        host: Set(Some("example.com".to_string())),
        port: Set(Some(443)),
        method: Set(Some("GET".to_string())),
        scheme: Set(Some("https".to_string())),
        authority: Set(None),
        path: Set(Some(path.to_string())),
        http_version: Set(Some("HTTP/1.1".to_string())),
        content_raw: Set(Some(Vec::new())),
        content: Set(None),
        error: Set(None),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    assert!(migrate(&db).await.is_ok());
    // Re-running is a no-op
    assert!(migrate(&db).await.is_ok());
}

#[tokio::test]
async fn test_request_ids_are_generated() {
    let db = setup_test_db().await;

    let first = get_request("/a").insert(&db).await.expect("Failed to insert");
    let second = get_request("/b").insert(&db).await.expect("Failed to insert");

    assert!(first.id > 0);
    assert!(second.id > first.id);
    assert_eq!(second.path.as_deref(), Some("/b"));
}

#[tokio::test]
async fn test_raw_content_round_trips_binary() {
    let db = setup_test_db().await;

    let mut model = get_request("/upload");
    model.content_raw = Set(Some(vec![0xff, 0x00, 0xfe, 0x7f]));
    let inserted = model.insert(&db).await.expect("Failed to insert");

    let found = request::Entity::find_by_id(inserted.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Request not found");

    assert_eq!(found.content_raw, Some(vec![0xff, 0x00, 0xfe, 0x7f]));
    assert!(found.content.is_none());
}

#[tokio::test]
async fn test_header_values_keep_order() {
    let db = setup_test_db().await;
    let parent = get_request("/").insert(&db).await.expect("Failed to insert");

    header::ActiveModel {
        id: NotSet,
        request: Set(parent.id),
        name: Set("Accept".to_string()),
        values: Set(FieldValues(vec![
            "text/html".to_string(),
            "application/json".to_string(),
        ])),
    }
    .insert(&db)
    .await
    .expect("Failed to insert header");

    let headers = parent
        .find_related(header::Entity)
        .all(&db)
        .await
        .expect("Failed to query");

    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].name, "Accept");
    assert_eq!(
        headers[0].values.as_slice(),
        ["text/html".to_string(), "application/json".to_string()]
    );
}

#[tokio::test]
async fn test_response_links_to_request() {
    let db = setup_test_db().await;
    let parent = get_request("/x").insert(&db).await.expect("Failed to insert");

    let inserted = response::ActiveModel {
        id: NotSet,
        run: Set(1),
        request: Set(Some(parent.id)),
        start_time: Set(Utc::now()),
        http_version: Set(Some("HTTP/1.1".to_string())),
        status_code: Set(200),
        reason: Set(Some("OK".to_string())),
        content_raw: Set(None),
        content: Set(None),
    }
    .insert(&db)
    .await
    .expect("Failed to insert response");

    response_cookie::ActiveModel {
        id: NotSet,
        response: Set(inserted.id),
        name: Set("sid".to_string()),
        values: Set(FieldValues(vec!["abc".to_string()])),
    }
    .insert(&db)
    .await
    .expect("Failed to insert cookie");

    let linked = inserted
        .find_related(request::Entity)
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Request not found");
    assert_eq!(linked.id, parent.id);

    let cookies = response_cookie::Entity::find()
        .filter(response_cookie::Column::Response.eq(inserted.id))
        .count(&db)
        .await
        .expect("Failed to count");
    assert_eq!(cookies, 1);
}

#[tokio::test]
async fn test_deleting_request_removes_headers() {
    let db = setup_test_db().await;
    let parent = get_request("/gone").insert(&db).await.expect("Failed to insert");

    header::ActiveModel {
        id: NotSet,
        request: Set(parent.id),
        name: Set("Host".to_string()),
        values: Set(FieldValues(vec!["example.com".to_string()])),
    }
    .insert(&db)
    .await
    .expect("Failed to insert header");

    parent.delete(&db).await.expect("Failed to delete");

    let remaining = header::Entity::find()
        .count(&db)
        .await
        .expect("Failed to count");
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_request_requires_existing_run() {
    let db = setup_test_db().await;

    let mut orphan = get_request("/orphan");
    orphan.run = Set(999);

    assert!(orphan.insert(&db).await.is_err());
}
