pub mod common;

use common::{create_joinery, StaticExecutor};
use joinery::{create_state, InitializationError};
use query_engine_metadata::metadata;
use serde_json::json;
use tests_common::fixtures::{query, scalars};

fn user() -> metadata::QueryRequest {
    query(metadata::Field::new("user").with_selections(scalars(&["id", "email"])))
}

#[tokio::test]
async fn explain_uses_the_configured_dialect() {
    let (_dir, joinery) = create_joinery(false).await;
    let explained = joinery.explain(&user(), &serde_json::Value::Null).unwrap();
    assert!(explained.contains("accounts AS \"user\""), "{explained}");
    assert!(explained.contains("\"email_address\""), "{explained}");
}

#[tokio::test]
async fn minified_configurations_shorten_aliases() {
    let (_dir, joinery) = create_joinery(true).await;
    let explained = joinery.explain(&user(), &serde_json::Value::Null).unwrap();
    assert!(!explained.contains("AS \"user\""), "{explained}");
}

#[tokio::test]
async fn queries_run_through_the_given_executor() {
    let (_dir, joinery) = create_joinery(false).await;
    let executor = StaticExecutor::new(json!([{"id": 1, "email": "ada@example.com"}]));

    let data = joinery
        .query(&executor, &user(), &serde_json::Value::Null)
        .await
        .unwrap();

    similar_asserts::assert_eq!(data, json!({"id": 1, "email": "ada@example.com"}));
    assert_eq!(executor.statements().len(), 1);
}

#[tokio::test]
async fn nodes_are_fetched_by_key() {
    let (_dir, joinery) = create_joinery(false).await;
    let executor = StaticExecutor::new(json!([{"id": 5, "body": "hello"}]));
    let request = query(metadata::Field::new("node").with_selections(scalars(&["id", "body"])));

    let data = joinery
        .node(&executor, "Post", json!(5), &request, &serde_json::Value::Null)
        .await
        .unwrap();

    similar_asserts::assert_eq!(data, json!({"id": 5, "body": "hello", "__typename": "Post"}));
    assert!(
        executor.statements()[0].ends_with("WHERE \"node\".\"id\" = 5"),
        "{:?}",
        executor.statements()
    );
}

#[tokio::test]
async fn running_queries_needs_a_connection_uri() {
    let (_dir, joinery) = create_joinery(false).await;
    let error = create_state(joinery.configuration()).await.err();
    assert!(matches!(
        error,
        Some(InitializationError::MissingConnectionUri)
    ));
}

#[tokio::test]
async fn missing_configuration_directories_fail_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let error = joinery::Joinery::from_directory(
        dir.path().join("nowhere"),
        std::collections::HashMap::<joinery_configuration::environment::Variable, String>::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(error, InitializationError::ParseConfiguration(_)));
}
