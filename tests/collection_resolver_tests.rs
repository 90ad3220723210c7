//! Collection create-or-adopt tests

mod common;

use common::*;
use docbase_client::{
    ClientError, FieldDefinition, Method, PrimaryKeyConfig, PrimaryKeyType,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_create_collection_sends_minimal_body() {
    let mock = MockTransport::new();
    let client = client(&mock, false);
    mock.respond(201, collection_json("col-1", "users"));

    let users = assert_ok!(client.collection("users").resolve().await);
    assert_eq!(users.name(), "users");
    assert_eq!(users.descriptor().await.id, "col-1");

    let request = mock.last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "https://db.test/api/collections");
    assert_eq!(request.header("x-api-key"), Some(API_KEY));
    assert_eq!(body_json(&request), json!({"name": "users"}));
}

#[tokio::test]
async fn test_create_collection_with_schema_and_primary_key() {
    let mock = MockTransport::new();
    let client = docbase_client::DocbaseClient::builder(BASE_URL)
        .api_key(API_KEY)
        .app_id("app-7")
        .transport(mock.clone())
        .build()
        .unwrap();
    mock.respond(201, collection_json("col-1", "users"));

    client
        .collection("users")
        .field("name", FieldDefinition::string().required())
        .primary_key(PrimaryKeyConfig::field("email").key_type(PrimaryKeyType::String))
        .await
        .unwrap();

    let request = mock.last_request();
    assert_eq!(request.header("x-app-id"), Some("app-7"));
    assert_eq!(
        body_json(&request),
        json!({
            "name": "users",
            "schema": "{\"name\":{\"type\":\"string\",\"required\":true}}",
            "app_id": "app-7",
            "primary_key": {"field": "email", "type": "string"}
        })
    );
}

#[tokio::test]
async fn test_conflict_without_schema_adopts_existing() {
    let mock = MockTransport::new();
    let client = client(&mock, false);

    mock.respond(201, collection_json("col-1", "users"));
    let first = client.collection("users").await.unwrap();

    mock.respond(409, json!({"error": "Collection already exists"}))
        .respond(
            200,
            json!([collection_json("col-0", "orders"), collection_json("col-1", "Users")]),
        );
    let second = client.collection("users").await.unwrap();

    assert_eq!(first.descriptor().await.id, second.descriptor().await.id);

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(requests[2].method, Method::Get);
    assert_eq!(requests[2].url, "https://db.test/api/collections");
}

#[tokio::test]
async fn test_conflict_with_schema_updates_instead_of_lookup() {
    let mock = MockTransport::new();
    let client = client(&mock, false);
    let schema = json!({"title": {"type": "string"}});

    mock.respond(409, json!({"error": "exists"}))
        .respond(200, collection_with_schema_json("col-5", "notes", &schema));

    let notes = client
        .collection("notes")
        .field("title", FieldDefinition::string())
        .await
        .unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, Method::Put);
    assert_eq!(requests[1].url, "https://db.test/api/collections/notes");
    assert_eq!(
        body_json(&requests[1]),
        json!({"schema": "{\"title\":{\"type\":\"string\"}}"})
    );

    let descriptor = notes.descriptor().await;
    assert_eq!(descriptor.id, "col-5");
    assert!(descriptor.fields().contains_key("title"));
}

#[tokio::test]
async fn test_conflict_with_missing_collection_is_not_found() {
    let mock = MockTransport::new();
    let client = client(&mock, false);

    mock.respond(409, json!({"error": "exists"}))
        .respond(200, json!([collection_json("col-0", "orders")]));

    let err = assert_err!(client.collection("users").await);
    assert!(matches!(err, ClientError::CollectionNotFound(ref name) if name == "users"));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_other_failures_propagate_without_retry() {
    let mock = MockTransport::new();
    let client = client(&mock, false);

    mock.respond(
        422,
        json!({"error": {"message": "invalid name", "code": "VALIDATION"}}),
    );
    let err = assert_err!(client.collection("bad name!").await);
    match err {
        ClientError::Api {
            status,
            message,
            code,
            ..
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "invalid name");
            assert_eq!(code.as_deref(), Some("VALIDATION"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn test_collection_creation_is_never_queued_offline() {
    let mock = MockTransport::new();
    let client = client(&mock, true);

    mock.fail_network("connection refused");
    let err = assert_err!(client.collection("users").await);
    assert!(err.is_network());
    assert!(!err.is_queued());
    assert_eq!(client.pending_count().await, 0);
}

#[tokio::test]
async fn test_resolve_is_repeatable() {
    let mock = MockTransport::new();
    let client = client(&mock, false);
    let builder = client.collection("users");

    mock.respond(201, collection_json("col-1", "users"));
    let a = builder.resolve().await.unwrap();

    mock.respond(409, json!({}))
        .respond(200, json!([collection_json("col-1", "users")]));
    let b = builder.resolve().await.unwrap();

    assert_eq!(a.descriptor().await, b.descriptor().await);
}

#[tokio::test]
async fn test_refresh_replaces_cached_descriptor() {
    let mock = MockTransport::new();
    let client = client(&mock, false);
    let users = resolved_collection(&client, &mock, "users").await;

    let schema = json!({"age": {"type": "number"}});
    mock.respond(
        200,
        json!([collection_with_schema_json("col-1", "users", &schema)]),
    );
    let fresh = users.refresh().await.unwrap();

    assert!(fresh.fields().contains_key("age"));
    assert_eq!(users.descriptor().await, fresh);
}

#[tokio::test]
async fn test_list_collections() {
    let mock = MockTransport::new();
    let client = client(&mock, false);

    mock.respond(
        200,
        json!({"items": [collection_json("a", "one"), collection_json("b", "two")]}),
    );
    let all = client.list_collections().await.unwrap();
    assert_eq!(
        all.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["one", "two"]
    );
}

#[test]
fn test_builder_validation() {
    let err = docbase_client::DocbaseClient::builder("https://db.test")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ClientError::InvalidRequest(_)));

    let err = docbase_client::DocbaseClient::builder("not a url")
        .api_key("k")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ClientError::InvalidRequest(_)));
}
