use futures::StreamExt;
use graphql_parser::query::Document;
use graphweave_query_plan::QueryPlan;
use serde_json::{json, Map, Value};

use crate::executors::map::SubgraphExecutorMap;
use crate::response::ExecutionResult;
use crate::schema_metadata::{SchemaMetadata, SchemaWithMetadata};
use crate::{execute_query_plan, ExecutorOutput, QueryPlanExecutionOptions};

fn schema() -> SchemaMetadata {
    graphql_parser::parse_schema::<String>(
        r#"
        type Query {
            foo: Foo
            products: [Product]
        }
        type Foo {
            id: ID
            bar: String
            baz: String
        }
        type Product {
            upc: ID
            name: String
        }
        type Subscription {
            ticks: Int
        }
        "#,
    )
    .expect("schema should parse")
    .schema_metadata()
}

fn plan(plan_json: Value) -> QueryPlan {
    serde_json::from_value(plan_json).expect("plan should deserialize")
}

fn operation(query: &str) -> Document<'static, String> {
    graphql_parser::parse_query::<String>(query)
        .expect("operation should parse")
        .into_static()
}

fn subgraph_result(result_json: Value) -> ExecutionResult {
    serde_json::from_value(result_json).expect("result should deserialize")
}

async fn run_single(
    query_plan: &QueryPlan,
    document: &Document<'static, String>,
    variables: Option<Map<String, Value>>,
    schema_metadata: &SchemaMetadata,
    executors: &SubgraphExecutorMap,
) -> ExecutionResult {
    let output = execute_query_plan(QueryPlanExecutionOptions {
        query_plan,
        document,
        operation_name: None,
        variables,
        schema_metadata,
        executors,
    })
    .await
    .expect("execution should succeed")
    .expect("plan should have a root node");
    match output {
        ExecutorOutput::Single(result) => result,
        ExecutorOutput::Stream(_) => panic!("expected a single result"),
    }
}

#[test]
fn sequence_merges_fetches_in_declaration_order() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Sequence",
                "nodes": [
                    {"kind": "Fetch", "serviceName": "a", "operation": "{ foo { id bar } }"},
                    {"kind": "Fetch", "serviceName": "b", "operation": "{ foo { bar baz } }"}
                ]
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("a", |_| {
            subgraph_result(json!({"data": {"foo": {"id": "1", "bar": "first"}}})).into()
        });
        executors.insert_fn("b", |_| {
            subgraph_result(json!({"data": {"foo": {"bar": "second", "baz": "B"}}})).into()
        });
        let document = operation("{ foo { id bar baz } }");
        let schema_metadata = schema();
        let result =
            run_single(&query_plan, &document, None, &schema_metadata, &executors).await;
        assert_eq!(
            result.data,
            Some(json!({"foo": {"id": "1", "bar": "second", "baz": "B"}}))
        );
        assert!(result.errors.is_none());
    });
}

#[test]
fn flatten_resolves_entities_with_their_required_fields() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Sequence",
                "nodes": [
                    {"kind": "Fetch", "serviceName": "a", "operation": "{ foo { __typename id } }"},
                    {
                        "kind": "Flatten",
                        "path": ["foo"],
                        "node": {
                            "kind": "Fetch",
                            "serviceName": "b",
                            "operation": "query($representations: [_Any!]!) { _entities(representations: $representations) { ... on Foo { bar } } }",
                            "requires": [
                                {"kind": "InlineFragment", "typeCondition": "Foo", "selections": [
                                    {"kind": "Field", "name": "__typename"},
                                    {"kind": "Field", "name": "id"}
                                ]}
                            ]
                        }
                    }
                ]
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("a", |_| {
            subgraph_result(json!({"data": {"foo": {"__typename": "Foo", "id": "1"}}})).into()
        });
        executors.insert_fn("b", |request| {
            let representations = request
                .variables
                .as_ref()
                .and_then(|variables| variables.get("representations"))
                .cloned();
            assert_eq!(
                representations,
                Some(json!([{"__typename": "Foo", "id": "1"}]))
            );
            subgraph_result(json!({"data": {"_entities": [{"bar": "B"}]}})).into()
        });
        let document = operation("{ foo { id bar } }");
        let schema_metadata = schema();
        let result =
            run_single(&query_plan, &document, None, &schema_metadata, &executors).await;
        assert_eq!(result.data, Some(json!({"foo": {"id": "1", "bar": "B"}})));
        assert!(result.errors.is_none());
    });
}

#[test]
fn list_paths_fan_out_over_every_element() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Sequence",
                "nodes": [
                    {"kind": "Fetch", "serviceName": "a", "operation": "{ products { __typename upc } }"},
                    {
                        "kind": "Flatten",
                        "path": ["products", "@"],
                        "node": {
                            "kind": "Fetch",
                            "serviceName": "b",
                            "operation": "query($representations: [_Any!]!) { _entities(representations: $representations) { ... on Product { name } } }",
                            "requires": [
                                {"kind": "InlineFragment", "typeCondition": "Product", "selections": [
                                    {"kind": "Field", "name": "__typename"},
                                    {"kind": "Field", "name": "upc"}
                                ]}
                            ]
                        }
                    }
                ]
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("a", |_| {
            subgraph_result(json!({"data": {"products": [
                {"__typename": "Product", "upc": "1"},
                {"__typename": "Product", "upc": "2"}
            ]}}))
            .into()
        });
        executors.insert_fn("b", |request| {
            let count = request
                .variables
                .as_ref()
                .and_then(|variables| variables.get("representations"))
                .and_then(Value::as_array)
                .map(Vec::len);
            assert_eq!(count, Some(2));
            subgraph_result(json!({"data": {"_entities": [
                {"name": "Table"},
                {"name": "Chair"}
            ]}}))
            .into()
        });
        let document = operation("{ products { upc name } }");
        let schema_metadata = schema();
        let result =
            run_single(&query_plan, &document, None, &schema_metadata, &executors).await;
        assert_eq!(
            result.data,
            Some(json!({"products": [
                {"upc": "1", "name": "Table"},
                {"upc": "2", "name": "Chair"}
            ]}))
        );
    });
}

#[test]
fn entity_fetch_failure_keeps_partial_data() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Sequence",
                "nodes": [
                    {"kind": "Fetch", "serviceName": "a", "operation": "{ foo { __typename id } }"},
                    {
                        "kind": "Flatten",
                        "path": ["foo"],
                        "node": {
                            "kind": "Fetch",
                            "serviceName": "b",
                            "operation": "query($representations: [_Any!]!) { _entities(representations: $representations) { ... on Foo { bar } } }",
                            "requires": [
                                {"kind": "InlineFragment", "typeCondition": "Foo", "selections": [
                                    {"kind": "Field", "name": "__typename"},
                                    {"kind": "Field", "name": "id"}
                                ]}
                            ]
                        }
                    }
                ]
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("a", |_| {
            subgraph_result(json!({"data": {"foo": {"__typename": "Foo", "id": "1"}}})).into()
        });
        executors.insert_fn("b", |_| {
            subgraph_result(json!({
                "data": {"_entities": [null]},
                "errors": [{"message": "bar is unavailable"}]
            }))
            .into()
        });
        let document = operation("{ foo { id bar } }");
        let schema_metadata = schema();
        let result =
            run_single(&query_plan, &document, None, &schema_metadata, &executors).await;
        assert_eq!(result.data, Some(json!({"foo": {"id": "1", "bar": null}})));
        let errors = result.errors.expect("the subgraph error should survive");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "bar is unavailable");
        assert_eq!(errors[0].path, Some(vec![json!("foo"), json!("bar")]));
    });
}

#[test]
fn parallel_branches_both_contribute() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Parallel",
                "nodes": [
                    {"kind": "Fetch", "serviceName": "a", "operation": "{ foo { id } }"},
                    {"kind": "Fetch", "serviceName": "c", "operation": "{ products { upc } }"}
                ]
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("a", |_| {
            subgraph_result(json!({"data": {"foo": {"id": "1"}}})).into()
        });
        executors.insert_fn("c", |_| {
            subgraph_result(json!({"data": {"products": [{"upc": "9"}]}})).into()
        });
        let document = operation("{ foo { id } products { upc } }");
        let schema_metadata = schema();
        let result =
            run_single(&query_plan, &document, None, &schema_metadata, &executors).await;
        assert_eq!(
            result.data,
            Some(json!({"foo": {"id": "1"}, "products": [{"upc": "9"}]}))
        );
    });
}

#[test]
fn condition_node_takes_the_else_branch_on_false() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Condition",
                "condition": "withFoo",
                "ifClause": {"kind": "Fetch", "serviceName": "a", "operation": "{ foo { id } }"},
                "elseClause": {"kind": "Fetch", "serviceName": "c", "operation": "{ products { upc } }"}
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("a", |_| panic!("the if branch must not run"));
        executors.insert_fn("c", |_| {
            subgraph_result(json!({"data": {"products": [{"upc": "9"}]}})).into()
        });
        let document =
            operation("query($withFoo: Boolean!) { products { upc } }");
        let variables = json!({"withFoo": false});
        let schema_metadata = schema();
        let result = run_single(
            &query_plan,
            &document,
            variables.as_object().cloned(),
            &schema_metadata,
            &executors,
        )
        .await;
        assert_eq!(result.data, Some(json!({"products": [{"upc": "9"}]})));
    });
}

#[test]
fn fetch_forwards_only_the_variables_it_uses() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Fetch",
                "serviceName": "a",
                "operation": "query($id: ID!) { foo { id } }",
                "variableUsages": ["id"]
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("a", |request| {
            assert_eq!(
                request.variables,
                json!({"id": "42"}).as_object().cloned()
            );
            subgraph_result(json!({"data": {"foo": {"id": "42"}}})).into()
        });
        let document = operation("query($id: ID!, $limit: Int) { foo { id } }");
        let variables = json!({"id": "42", "limit": 3});
        let schema_metadata = schema();
        let result = run_single(
            &query_plan,
            &document,
            variables.as_object().cloned(),
            &schema_metadata,
            &executors,
        )
        .await;
        assert_eq!(result.data, Some(json!({"foo": {"id": "42"}})));
    });
}

#[test]
fn missing_subgraph_degrades_into_an_error_response() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {"kind": "Fetch", "serviceName": "nowhere", "operation": "{ foo { id } }"}
        }));
        let executors = SubgraphExecutorMap::new();
        let document = operation("{ foo { id } }");
        let schema_metadata = schema();
        let result =
            run_single(&query_plan, &document, None, &schema_metadata, &executors).await;
        assert!(result.data.is_none());
        let errors = result.errors.expect("the missing executor should report");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("nowhere"));
        assert_eq!(errors[0].path, Some(vec![json!("foo")]));
    });
}

#[test]
fn an_empty_plan_produces_no_output() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({"node": null}));
        let executors = SubgraphExecutorMap::new();
        let document = operation("{ foo { id } }");
        let schema_metadata = schema();
        let output = execute_query_plan(QueryPlanExecutionOptions {
            query_plan: &query_plan,
            document: &document,
            operation_name: None,
            variables: None,
            schema_metadata: &schema_metadata,
            executors: &executors,
        })
        .await
        .expect("execution should succeed");
        assert!(output.is_none());
    });
}

#[test]
fn subscriptions_project_every_event() {
    tokio_test::block_on(async {
        let query_plan = plan(json!({
            "node": {
                "kind": "Subscription",
                "primary": {
                    "kind": "Fetch",
                    "serviceName": "s",
                    "operation": "subscription { ticks }",
                    "operationKind": "subscription"
                }
            }
        }));
        let mut executors = SubgraphExecutorMap::new();
        executors.insert_fn("s", |_| {
            crate::SubgraphResponse::Stream(
                futures::stream::iter(vec![
                    subgraph_result(json!({"data": {"ticks": 1, "noise": true}})),
                    subgraph_result(json!({"data": {"ticks": 2}})),
                ])
                .boxed(),
            )
        });
        let document = operation("subscription { ticks }");
        let schema_metadata = schema();
        let output = execute_query_plan(QueryPlanExecutionOptions {
            query_plan: &query_plan,
            document: &document,
            operation_name: None,
            variables: None,
            schema_metadata: &schema_metadata,
            executors: &executors,
        })
        .await
        .expect("execution should succeed")
        .expect("plan should have a root node");
        let stream = match output {
            ExecutorOutput::Stream(stream) => stream,
            ExecutorOutput::Single(_) => panic!("expected a stream"),
        };
        let events: Vec<ExecutionResult> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, Some(json!({"ticks": 1})));
        assert_eq!(events[1].data, Some(json!({"ticks": 2})));
    });
}
