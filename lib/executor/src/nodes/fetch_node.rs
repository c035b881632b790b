use futures::future::BoxFuture;
use futures::StreamExt;
use graphql_parser::query as ast;
use graphweave_query_plan::{FetchNode, FlattenPathSegment};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::context::ExecutionContext;
use crate::deep_merge::deep_merge;
use crate::error::PlanExecutionError;
use crate::executors::common::{SubgraphRequest, SubgraphResponse};
use crate::requires::project_requires;
use crate::response::{relocate_subgraph_errors, ExecutionResult};
use crate::rewrites::ApplyFetchRewrite;
use crate::traverse::{collect_at_path, set_at_path};

pub const REPRESENTATIONS_VARIABLE: &str = "representations";
pub const ENTITIES_FIELD: &str = "_entities";

pub trait ExecutableFetchNode {
    /// Copies the variables this fetch consumes out of the outer variable
    /// values. Variables the client never provided are simply absent.
    fn variables_from_usages(&self, ctx: &ExecutionContext) -> Map<String, Value>;

    /// Collects the entities under `path`, filters and projects them through
    /// the `requires` selections, and applies input rewrites. Returns the
    /// surviving representations alongside the concrete path of each one.
    fn prepare_representations(
        &self,
        root: &Value,
        path: &[FlattenPathSegment],
        ctx: &ExecutionContext,
    ) -> (Vec<Value>, Vec<Vec<Value>>);

    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>>;
}

impl ExecutableFetchNode for FetchNode {
    fn variables_from_usages(&self, ctx: &ExecutionContext) -> Map<String, Value> {
        let mut variables = Map::new();
        if let Some(variable_values) = &ctx.variable_values {
            for variable_name in &self.variable_usages {
                if let Some(value) = variable_values.get(variable_name) {
                    variables.insert(variable_name.to_string(), value.clone());
                }
            }
        }
        variables
    }

    fn prepare_representations(
        &self,
        root: &Value,
        path: &[FlattenPathSegment],
        ctx: &ExecutionContext,
    ) -> (Vec<Value>, Vec<Vec<Value>>) {
        let requires = self.requires.as_deref().unwrap_or(&[]);
        let mut representations = Vec::new();
        let mut representation_paths = Vec::new();
        for (entity_path, entity) in collect_at_path(root, path) {
            let mut projected = project_requires(ctx.schema_metadata, requires, entity);
            if projected.is_null() {
                // The entity cannot supply anything toward the requirement.
                // It drops from the batch without an error and its fields
                // resolve as null at projection time.
                continue;
            }
            if let Some(input_rewrites) = &self.input_rewrites {
                for rewrite in input_rewrites {
                    rewrite.apply(ctx.schema_metadata, &mut projected);
                }
            }
            representations.push(projected);
            representation_paths.push(entity_path);
        }
        (representations, representation_paths)
    }

    #[instrument(level = "debug", skip_all, name = "FetchNode::execute", fields(
        service_name = %self.service_name,
    ))]
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>> {
        Box::pin(async move {
            let mut variables = self.variables_from_usages(ctx);
            // A fetch reached through a flatten path resolves entities; a
            // fetch at the plan root queries the subgraph directly.
            let representation_paths = if path.is_empty() {
                None
            } else {
                let (representations, representation_paths) =
                    self.prepare_representations(root, &path, ctx);
                if representations.is_empty() {
                    return Ok(ExecutionResult::default());
                }
                variables.insert(
                    REPRESENTATIONS_VARIABLE.to_string(),
                    Value::Array(representations),
                );
                Some(representation_paths)
            };

            let request = SubgraphRequest {
                query: &self.operation,
                operation_name: self.operation_name.as_deref(),
                operation_kind: self.operation_kind,
                variables: if variables.is_empty() {
                    None
                } else {
                    Some(variables)
                },
            };
            let response = ctx.executors.execute(&self.service_name, request).await;
            let mut result = collapse_response(response).await;

            if let (Some(output_rewrites), Some(data)) =
                (&self.output_rewrites, result.data.as_mut())
            {
                for rewrite in output_rewrites {
                    rewrite.apply(ctx.schema_metadata, data);
                }
            }

            let errors = match result.errors.take() {
                Some(errors) => relocate_subgraph_errors(
                    errors,
                    &error_base_path(&path),
                    representation_paths.as_deref(),
                    &error_anchor(&self.operation),
                ),
                None => Vec::new(),
            };

            let data = match representation_paths {
                Some(representation_paths) => {
                    let mut patch = Value::Null;
                    if let Some(entities) = take_entities(result.data.take()) {
                        for (entity_path, entity) in
                            representation_paths.iter().zip(entities)
                        {
                            set_at_path(&mut patch, entity_path, entity);
                        }
                    }
                    Some(patch)
                }
                None => result.data.take(),
            };

            Ok(ExecutionResult::new(data, Some(errors), result.extensions))
        })
    }
}

/// Streams delivered for plain fetches collapse into a single result; every
/// item merges onto the previous ones in arrival order.
async fn collapse_response(response: SubgraphResponse) -> ExecutionResult {
    match response {
        SubgraphResponse::Single(result) => result,
        SubgraphResponse::Stream(mut stream) => {
            let mut collapsed = ExecutionResult::default();
            while let Some(item) = stream.next().await {
                merge_result(&mut collapsed, item);
            }
            collapsed
        }
    }
}

fn merge_result(target: &mut ExecutionResult, source: ExecutionResult) {
    if let Some(source_data) = source.data {
        match target.data.as_mut() {
            Some(target_data) => deep_merge(target_data, source_data),
            None => target.data = Some(source_data),
        }
    }
    if let Some(source_errors) = source.errors {
        target
            .errors
            .get_or_insert_with(Vec::new)
            .extend(source_errors);
    }
    if let Some(source_extensions) = source.extensions {
        target
            .extensions
            .get_or_insert_with(Map::new)
            .extend(source_extensions);
    }
}

fn take_entities(data: Option<Value>) -> Option<Vec<Value>> {
    match data {
        Some(Value::Object(mut map)) => match map.remove(ENTITIES_FIELD) {
            Some(Value::Array(entities)) => Some(entities),
            _ => None,
        },
        _ => None,
    }
}

/// Field-only form of the flatten path this fetch served, used as the base
/// of relocated error paths. List fan-out makes indices ambiguous, so the
/// base stops at the first list segment.
fn error_base_path(path: &[FlattenPathSegment]) -> Vec<Value> {
    let mut base = Vec::new();
    for segment in path {
        match segment {
            FlattenPathSegment::Field(name) => base.push(Value::String(name.to_string())),
            FlattenPathSegment::List => break,
        }
    }
    base
}

/// Anchor for subgraph errors that arrive without a path: the first top-level
/// field of the fetched operation, descending through the `_entities` wrapper
/// into the first fragment's first field.
pub(crate) fn error_anchor(operation: &str) -> Vec<Value> {
    match anchor_field(operation) {
        Some(name) => vec![Value::String(name)],
        None => Vec::new(),
    }
}

fn anchor_field(operation: &str) -> Option<String> {
    let document = graphql_parser::parse_query::<String>(operation).ok()?;
    let selection_set = document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            ast::Definition::Operation(ast::OperationDefinition::SelectionSet(set)) => Some(set),
            ast::Definition::Operation(ast::OperationDefinition::Query(query)) => {
                Some(&query.selection_set)
            }
            ast::Definition::Operation(ast::OperationDefinition::Mutation(mutation)) => {
                Some(&mutation.selection_set)
            }
            ast::Definition::Operation(ast::OperationDefinition::Subscription(subscription)) => {
                Some(&subscription.selection_set)
            }
            ast::Definition::Fragment(_) => None,
        })?;
    let first_field = first_field_of(selection_set)?;
    if first_field.name == ENTITIES_FIELD {
        let entity_field = first_field
            .selection_set
            .items
            .iter()
            .find_map(|item| match item {
                ast::Selection::InlineFragment(fragment) => first_field_of(&fragment.selection_set),
                ast::Selection::Field(field) => Some(field),
                ast::Selection::FragmentSpread(_) => None,
            })?;
        Some(response_key_of(entity_field))
    } else {
        Some(response_key_of(first_field))
    }
}

fn first_field_of<'a, 'd>(
    selection_set: &'a ast::SelectionSet<'d, String>,
) -> Option<&'a ast::Field<'d, String>> {
    selection_set.items.iter().find_map(|item| match item {
        ast::Selection::Field(field) => Some(field),
        _ => None,
    })
}

fn response_key_of(field: &ast::Field<'_, String>) -> String {
    field.alias.clone().unwrap_or_else(|| field.name.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn anchor_descends_through_the_entities_wrapper() {
        let operation = "query($representations: [_Any!]!) { _entities(representations: $representations) { ... on Foo { bar } } }";
        assert_eq!(error_anchor(operation), vec![json!("bar")]);
    }

    #[test]
    fn anchor_uses_the_alias_of_a_plain_root_field() {
        assert_eq!(error_anchor("{ renamed: topProducts { id } }"), vec![json!("renamed")]);
    }

    #[test]
    fn unparsable_operations_produce_no_anchor() {
        assert!(error_anchor("not graphql").is_empty());
    }

    #[test]
    fn base_path_stops_at_the_first_list_segment() {
        let path = vec![
            FlattenPathSegment::Field("products".to_string()),
            FlattenPathSegment::List,
            FlattenPathSegment::Field("vendor".to_string()),
        ];
        assert_eq!(error_base_path(&path), vec![json!("products")]);
    }
}
