use futures::future::BoxFuture;
use graphweave_query_plan::{ConditionNode, FlattenPathSegment, PlanNode};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::PlanExecutionError;
use crate::nodes::plan_node::ExecutablePlanNode;
use crate::response::ExecutionResult;

pub trait ExecutableConditionNode {
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>>;
    fn selected_branch(&self, ctx: &ExecutionContext) -> Option<&PlanNode>;
}

impl ExecutableConditionNode for ConditionNode {
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>> {
        match self.selected_branch(ctx) {
            Some(node) => node.execute(root, path, ctx),
            // Neither branch executing is a valid outcome.
            None => Box::pin(async move { Ok(ExecutionResult::default()) }),
        }
    }

    fn selected_branch(&self, ctx: &ExecutionContext) -> Option<&PlanNode> {
        let condition_value = match ctx.condition_variable(&self.condition) {
            Some(Value::Bool(boolean)) => *boolean,
            Some(Value::Null) | None => false,
            Some(_) => true,
        };
        if condition_value {
            self.if_clause.as_deref()
        } else {
            self.else_clause.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use graphweave_query_plan::{FetchNode, OperationKind};
    use serde_json::Map;

    use crate::executors::map::SubgraphExecutorMap;
    use crate::schema_metadata::SchemaMetadata;

    use super::*;

    fn fetch_named(service_name: &str) -> PlanNode {
        PlanNode::Fetch(FetchNode {
            service_name: service_name.to_string(),
            operation: "{ ping }".to_string(),
            operation_name: None,
            operation_kind: OperationKind::Query,
            variable_usages: vec![],
            requires: None,
            input_rewrites: None,
            output_rewrites: None,
        })
    }

    fn condition(if_clause: Option<PlanNode>, else_clause: Option<PlanNode>) -> ConditionNode {
        ConditionNode {
            condition: "flag".to_string(),
            if_clause: if_clause.map(Box::new),
            else_clause: else_clause.map(Box::new),
        }
    }

    fn context_with_flag<'a>(
        schema_metadata: &'a SchemaMetadata,
        executors: &'a SubgraphExecutorMap,
        operation: &'a graphql_parser::query::OperationDefinition<'static, String>,
        flag: Option<Value>,
    ) -> ExecutionContext<'a> {
        let variable_values = flag.map(|flag| {
            let mut map = Map::new();
            map.insert("flag".to_string(), flag);
            map
        });
        ExecutionContext {
            schema_metadata,
            executors,
            operation,
            fragments: Default::default(),
            variable_values,
        }
    }

    fn service_of(node: Option<&PlanNode>) -> Option<&str> {
        match node {
            Some(PlanNode::Fetch(fetch)) => Some(fetch.service_name.as_str()),
            _ => None,
        }
    }

    #[test]
    fn boolean_variable_picks_the_branch() {
        let document = graphql_parser::parse_query::<String>("{ ping }")
            .expect("query should parse")
            .into_static();
        let operation = match &document.definitions[0] {
            graphql_parser::query::Definition::Operation(operation) => operation,
            _ => unreachable!(),
        };
        let schema_metadata = SchemaMetadata::default();
        let executors = SubgraphExecutorMap::new();
        let node = condition(Some(fetch_named("if-side")), Some(fetch_named("else-side")));

        let ctx = context_with_flag(&schema_metadata, &executors, operation, Some(Value::Bool(true)));
        assert_eq!(service_of(node.selected_branch(&ctx)), Some("if-side"));

        let ctx = context_with_flag(&schema_metadata, &executors, operation, Some(Value::Bool(false)));
        assert_eq!(service_of(node.selected_branch(&ctx)), Some("else-side"));

        // A missing variable behaves like false.
        let ctx = context_with_flag(&schema_metadata, &executors, operation, None);
        assert_eq!(service_of(node.selected_branch(&ctx)), Some("else-side"));
    }

    #[test]
    fn missing_branch_produces_nothing() {
        let document = graphql_parser::parse_query::<String>("{ ping }")
            .expect("query should parse")
            .into_static();
        let operation = match &document.definitions[0] {
            graphql_parser::query::Definition::Operation(operation) => operation,
            _ => unreachable!(),
        };
        let schema_metadata = SchemaMetadata::default();
        let executors = SubgraphExecutorMap::new();
        let node = condition(Some(fetch_named("if-side")), None);
        let ctx = context_with_flag(&schema_metadata, &executors, operation, Some(Value::Bool(false)));
        assert!(node.selected_branch(&ctx).is_none());
    }
}
