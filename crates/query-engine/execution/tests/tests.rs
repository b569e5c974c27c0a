mod common;

use common::{postgres, FailingExecutor, ScriptedExecutor};
use query_engine_execution::query;
use query_engine_metadata::metadata;
use query_engine_translation::translation::cursor;
use query_engine_translation::translation::error::ErrorKind;
use query_engine_translation::translation::query::NodeCondition;
use serde_json::json;
use tests_common::fixtures::{blog_schema, connection, field, query as request, scalars};

fn with(name: &str, selections: Vec<metadata::Selection>) -> metadata::QueryRequest {
    request(metadata::Field::new(name).with_selections(selections))
}

async fn run(
    request: &metadata::QueryRequest,
    executor: &ScriptedExecutor,
) -> Result<serde_json::Value, query_engine_execution::error::Error> {
    query::run(
        &blog_schema(),
        request,
        &serde_json::Value::Null,
        executor,
        &postgres(),
    )
    .await
}

mod batches {
    use super::*;

    #[tokio::test]
    async fn batched_children_are_fetched_after_their_parents() {
        let mut selections = scalars(&["id"]);
        selections.push(field("posts", scalars(&["id"])));
        selections.push(field("comments", scalars(&["id"])));
        let executor = ScriptedExecutor::new(vec![
            json!([{"id": 1, "posts__id": 10}, {"id": 1, "posts__id": 11}]),
            json!([{"id": 100, "author_id": 1}, {"id": 101, "author_id": 1}]),
        ]);

        let data = run(&with("user", selections), &executor).await.unwrap();

        similar_asserts::assert_eq!(
            data,
            json!({
                "id": 1,
                "posts": [{"id": 10}, {"id": 11}],
                "comments": [{"id": 100, "author_id": 1}, {"id": 101, "author_id": 1}],
            })
        );
        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert!(
            statements[1].contains("WHERE \"comments\".\"author_id\" IN (1)"),
            "{}",
            statements[1]
        );
    }

    #[tokio::test]
    async fn children_are_grouped_by_their_parent_key() {
        let mut selections = scalars(&["id"]);
        selections.push(field("comments", scalars(&["id"])));
        selections.push(field("favorite", scalars(&["id"])));
        let executor = ScriptedExecutor::new(vec![
            json!([
                {"id": 1, "favorite_post_id": 5},
                {"id": 2, "favorite_post_id": 6},
                {"id": 3, "favorite_post_id": 7},
            ]),
            json!([
                {"id": 100, "author_id": 1},
                {"id": 101, "author_id": 1},
                {"id": 102, "author_id": 2},
            ]),
            json!([{"id": 5}, {"id": 6}]),
        ]);

        let data = run(&with("users", selections), &executor).await.unwrap();

        // the third user has no favorite post, so it is left out
        similar_asserts::assert_eq!(
            data,
            json!([
                {
                    "id": 1,
                    "favorite_post_id": 5,
                    "comments": [{"id": 100, "author_id": 1}, {"id": 101, "author_id": 1}],
                    "favorite": {"id": 5},
                },
                {
                    "id": 2,
                    "favorite_post_id": 6,
                    "comments": [{"id": 102, "author_id": 2}],
                    "favorite": {"id": 6},
                },
            ])
        );
        let statements = executor.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[1].contains("IN (1, 2, 3)"), "{}", statements[1]);
        assert!(statements[2].contains("IN (5, 6, 7)"), "{}", statements[2]);
    }

    #[tokio::test]
    async fn batches_nest_level_by_level() {
        let mut selections = scalars(&["id"]);
        selections.push(field(
            "followers",
            vec![
                metadata::Selection::field("id"),
                field("comments", scalars(&["id"])),
            ],
        ));
        let executor = ScriptedExecutor::new(vec![
            json!([{"id": 1}]),
            json!([
                {"fol#fol": "21", "id": 2, "followee_id": 1},
                {"fol#fol": "31", "id": 3, "followee_id": 1},
            ]),
            json!([{"id": 100, "author_id": 3}]),
        ]);

        let data = run(&with("user", selections), &executor).await.unwrap();

        similar_asserts::assert_eq!(
            data,
            json!({
                "id": 1,
                "followers": [
                    {"fol#fol": "21", "id": 2, "followee_id": 1, "comments": []},
                    {
                        "fol#fol": "31",
                        "id": 3,
                        "followee_id": 1,
                        "comments": [{"id": 100, "author_id": 3}],
                    },
                ],
            })
        );
        let statements = executor.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[1].contains("FROM relationships"), "{}", statements[1]);
        assert!(statements[2].contains("IN (2, 3)"), "{}", statements[2]);
    }

    #[tokio::test]
    async fn parents_without_keys_need_no_statement() {
        let mut selections = scalars(&["id"]);
        selections.push(field("favorite", scalars(&["id"])));
        let executor = ScriptedExecutor::new(vec![json!([{"id": 1, "favorite_post_id": null}])]);

        let data = run(&with("user", selections), &executor).await.unwrap();

        similar_asserts::assert_eq!(
            data,
            json!({"id": 1, "favorite_post_id": null, "favorite": null})
        );
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn paginated_batches_become_connections_per_parent() {
        let selections = vec![
            metadata::Selection::field("id"),
            metadata::Selection::Field(
                metadata::Field::new("pagedComments")
                    .with_arguments(json!({"first": 2}))
                    .with_selections(connection(scalars(&["id"]))),
            ),
        ];
        let executor = ScriptedExecutor::new(vec![
            json!([{"id": 1}]),
            json!([
                {"id": 100, "$total": 3, "author_id": 1},
                {"id": 101, "$total": 3, "author_id": 1},
                {"id": 102, "$total": 3, "author_id": 1},
            ]),
        ]);

        let data = run(&with("user", selections), &executor).await.unwrap();

        let comments = &data["pagedComments"];
        assert_eq!(comments["total"], json!(3));
        assert_eq!(comments["edges"].as_array().unwrap().len(), 2);
        assert_eq!(comments["edges"][0]["node"]["id"], json!(100));
        assert_eq!(comments["edges"][0]["cursor"], json!(cursor::encode_offset(0)));
        assert_eq!(comments["pageInfo"]["hasNextPage"], json!(true));
    }

    #[tokio::test]
    async fn a_failing_batch_fails_the_request() {
        let mut selections = scalars(&["id"]);
        selections.push(field("comments", scalars(&["id"])));
        let executor = ScriptedExecutor::new(vec![json!([{"id": 1}])]);

        let error = run(&with("user", selections), &executor).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ExternalCall);
        assert_eq!(executor.statements().len(), 2);
    }
}

mod shaping {
    use super::*;

    #[tokio::test]
    async fn union_members_keep_their_own_fields() {
        let request = with(
            "authored",
            vec![
                metadata::Selection::InlineFragment(metadata::InlineFragment {
                    type_condition: Some("Post".to_string()),
                    selections: scalars(&["body"]),
                }),
                metadata::Selection::InlineFragment(metadata::InlineFragment {
                    type_condition: Some("Comment".to_string()),
                    selections: scalars(&["postId"]),
                }),
            ],
        );
        let executor = ScriptedExecutor::new(vec![json!([
            {"id#$ty": "1Post", "$type": "Post", "body@Post": "hello", "postId@Comment": null},
            {"id#$ty": "1Comment", "$type": "Comment", "body@Post": null, "postId@Comment": 1},
        ])]);

        let data = run(&request, &executor).await.unwrap();

        similar_asserts::assert_eq!(
            data,
            json!([
                {"id#$ty": "1Post", "$type": "Post", "body": "hello", "postId": null},
                {"id#$ty": "1Comment", "$type": "Comment", "body": null, "postId": 1},
            ])
        );
    }

    #[tokio::test]
    async fn root_connections_hold_one_page() {
        let request = request(
            metadata::Field::new("usersConnection")
                .with_arguments(json!({"first": 1}))
                .with_selections(connection(scalars(&["id", "email"]))),
        );
        let executor = ScriptedExecutor::new(vec![json!([
            {"id": 1, "email": "ada@example.com"},
            {"id": 2, "email": "alan@example.com"},
        ])]);

        let data = run(&request, &executor).await.unwrap();

        let cursor = cursor::encode(&json!({"id": 1}));
        similar_asserts::assert_eq!(
            data,
            json!({
                "edges": [{"cursor": cursor, "node": {"id": 1, "email": "ada@example.com"}}],
                "pageInfo": {
                    "hasNextPage": true,
                    "hasPreviousPage": false,
                    "startCursor": cursor,
                    "endCursor": cursor,
                },
            })
        );
    }

    #[tokio::test]
    async fn joined_connections_are_built_inside_their_parent() {
        let selections = vec![
            metadata::Selection::field("id"),
            metadata::Selection::Field(
                metadata::Field::new("postsConnection")
                    .with_arguments(json!({"first": 2}))
                    .with_selections(connection(scalars(&["id"]))),
            ),
        ];
        let executor = ScriptedExecutor::new(vec![json!([
            {"id": 1, "postsConne__id": 12},
            {"id": 1, "postsConne__id": 11},
            {"id": 1, "postsConne__id": 10},
        ])]);

        let data = run(&with("user", selections), &executor).await.unwrap();

        let posts = &data["postsConnection"];
        assert_eq!(posts["edges"].as_array().unwrap().len(), 2);
        assert_eq!(posts["edges"][1]["node"], json!({"id": 11}));
        assert_eq!(posts["pageInfo"]["hasNextPage"], json!(true));
        assert_eq!(
            posts["pageInfo"]["endCursor"],
            json!(cursor::encode(&json!({"id": 11})))
        );
    }
}

mod nodes {
    use super::*;

    async fn post(executor: &ScriptedExecutor) -> serde_json::Value {
        let request = with("node", scalars(&["id", "body"]));
        query::get_node(
            &blog_schema(),
            "Post",
            &request,
            &serde_json::Value::Null,
            NodeCondition::Key(json!(5)),
            executor,
            &postgres(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn nodes_carry_their_type_name() {
        let executor = ScriptedExecutor::new(vec![json!([{"id": 5, "body": "hello"}])]);

        similar_asserts::assert_eq!(
            post(&executor).await,
            json!({"id": 5, "body": "hello", "__typename": "Post"})
        );
        similar_asserts::assert_eq!(
            executor.statements(),
            vec![
                "SELECT \"node\".\"id\" AS \"id\", \"node\".\"body\" AS \"body\" \
                 FROM posts AS \"node\" WHERE \"node\".\"id\" = 5"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn missing_nodes_are_null() {
        let executor = ScriptedExecutor::new(vec![json!({"rows": []})]);
        assert_eq!(post(&executor).await, json!(null));
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn results_must_be_rows() {
        let executor = ScriptedExecutor::new(vec![json!({"id": 1})]);
        let error = run(&with("user", scalars(&["id"])), &executor)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DataShape);
    }

    #[tokio::test]
    async fn executor_failures_are_passed_on() {
        let error = query::run(
            &blog_schema(),
            &with("user", scalars(&["id"])),
            &serde_json::Value::Null,
            &FailingExecutor,
            &postgres(),
        )
        .await
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExternalCall);
        assert_eq!(error.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn translation_errors_stop_before_any_statement() {
        let executor = ScriptedExecutor::new(vec![]);
        let error = run(&with("user", scalars(&["nickname"])), &executor)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(executor.statements().is_empty());
    }
}

#[test]
fn explain_pretty_prints_the_root_statement() {
    tests_common::logging::init();
    let mut selections = scalars(&["id"]);
    selections.push(field("posts", scalars(&["id"])));
    let explained = query::explain(
        &blog_schema(),
        &with("user", selections),
        &serde_json::Value::Null,
        &postgres(),
    )
    .unwrap();
    assert!(explained.contains("accounts AS \"user\""), "{explained}");
    assert!(explained.lines().count() > 1, "{explained}");
}
