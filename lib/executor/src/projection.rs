use graphql_parser::query as ast;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::context::{operation_kind_of, operation_selection_set, ExecutionContext};
use crate::deep_merge::deep_merge;
use crate::error::PlanExecutionError;
use crate::response::GraphQLError;
use crate::rewrites::TYPENAME_FIELD;

/// Shapes the merged subgraph data into exactly what the client operation
/// selected. Fields the plan fetched but the operation never asked for are
/// dropped; selected fields missing from the data resolve as null. A
/// selection that names a type or field the schema does not know is a
/// contract violation and aborts the projection.
#[instrument(level = "debug", skip_all, name = "project_by_operation")]
pub fn project_by_operation(
    data: &Value,
    ctx: &ExecutionContext<'_>,
    errors: &mut Vec<GraphQLError>,
) -> Result<Value, PlanExecutionError> {
    let operation_kind = operation_kind_of(ctx.operation);
    let root_type = ctx
        .schema_metadata
        .root_type_name(operation_kind)
        .ok_or(PlanExecutionError::UnsupportedRootOperation(
            operation_kind.as_str(),
        ))?;
    project_field_value(
        data,
        &operation_selection_set(ctx.operation).items,
        root_type,
        ctx,
        errors,
    )
}

fn project_field_value(
    value: &Value,
    selections: &[ast::Selection<'static, String>],
    type_name: &str,
    ctx: &ExecutionContext<'_>,
    errors: &mut Vec<GraphQLError>,
) -> Result<Value, PlanExecutionError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => {
            let mut projected = Vec::with_capacity(items.len());
            for item in items {
                projected.push(project_field_value(item, selections, type_name, ctx, errors)?);
            }
            Ok(Value::Array(projected))
        }
        // An object with no selections sits at a leaf position, which only
        // happens for object-shaped custom scalars. Those pass through whole.
        Value::Object(_) if selections.is_empty() => Ok(value.clone()),
        Value::Object(map) => project_object(map, selections, type_name, ctx, errors),
        Value::String(string_value) => {
            if let Some(enum_values) = ctx.schema_metadata.enum_values.get(type_name) {
                if !enum_values.iter().any(|candidate| candidate == string_value) {
                    errors.push(GraphQLError::from_message(format!(
                        "Value is not a valid enum value for type '{}'",
                        type_name
                    )));
                    return Ok(Value::Null);
                }
            }
            Ok(value.clone())
        }
        leaf => Ok(leaf.clone()),
    }
}

fn project_object(
    map: &Map<String, Value>,
    selections: &[ast::Selection<'static, String>],
    declared_type: &str,
    ctx: &ExecutionContext<'_>,
    errors: &mut Vec<GraphQLError>,
) -> Result<Value, PlanExecutionError> {
    // A __typename written by a subgraph names the concrete runtime type and
    // overrides the type the schema declares for this position.
    let type_name = match map.get(TYPENAME_FIELD) {
        Some(Value::String(runtime_type)) => runtime_type.as_str(),
        _ => declared_type,
    };
    let mut projected = Map::new();
    project_selections(map, selections, type_name, ctx, errors, &mut projected)?;
    Ok(Value::Object(projected))
}

fn project_selections(
    map: &Map<String, Value>,
    selections: &[ast::Selection<'static, String>],
    type_name: &str,
    ctx: &ExecutionContext<'_>,
    errors: &mut Vec<GraphQLError>,
    projected: &mut Map<String, Value>,
) -> Result<(), PlanExecutionError> {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                if !should_include(&field.directives, ctx) {
                    continue;
                }
                let response_key = field.alias.as_ref().unwrap_or(&field.name);
                if field.name == TYPENAME_FIELD {
                    insert_merged(
                        projected,
                        response_key,
                        Value::String(type_name.to_string()),
                    );
                    continue;
                }
                let type_fields = ctx
                    .schema_metadata
                    .type_fields
                    .get(type_name)
                    .ok_or_else(|| PlanExecutionError::UnknownType(type_name.to_string()))?;
                let field_type = type_fields.get(&field.name).ok_or_else(|| {
                    PlanExecutionError::UnknownField {
                        type_name: type_name.to_string(),
                        field_name: field.name.clone(),
                    }
                })?;
                // Data may sit under the alias (the plan queried with it)
                // or under the plain field name (another fetch supplied it).
                let value = match map.get(response_key).or_else(|| map.get(&field.name)) {
                    Some(value) => project_field_value(
                        value,
                        &field.selection_set.items,
                        field_type,
                        ctx,
                        errors,
                    )?,
                    None => Value::Null,
                };
                insert_merged(projected, response_key, value);
            }
            ast::Selection::InlineFragment(fragment) => {
                if !should_include(&fragment.directives, ctx) {
                    continue;
                }
                let fragment_type = fragment_type_name(
                    map,
                    type_name,
                    fragment.type_condition.as_ref(),
                    ctx,
                );
                if let Some(fragment_type) = fragment_type {
                    project_selections(
                        map,
                        &fragment.selection_set.items,
                        fragment_type,
                        ctx,
                        errors,
                        projected,
                    )?;
                }
            }
            ast::Selection::FragmentSpread(spread) => {
                if !should_include(&spread.directives, ctx) {
                    continue;
                }
                let fragment = ctx
                    .fragments
                    .get(spread.fragment_name.as_str())
                    .ok_or_else(|| {
                        PlanExecutionError::UnknownFragment(spread.fragment_name.clone())
                    })?;
                let fragment_type = fragment_type_name(
                    map,
                    type_name,
                    Some(&fragment.type_condition),
                    ctx,
                );
                if let Some(fragment_type) = fragment_type {
                    project_selections(
                        map,
                        &fragment.selection_set.items,
                        fragment_type,
                        ctx,
                        errors,
                        projected,
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Applies a fragment's type condition against the resolved type of the
/// object. A matching condition narrows the type used for the fragment's
/// own selections unless the object already carries a runtime __typename.
fn fragment_type_name<'a>(
    map: &Map<String, Value>,
    type_name: &'a str,
    type_condition: Option<&'a ast::TypeCondition<'static, String>>,
    ctx: &ExecutionContext<'_>,
) -> Option<&'a str> {
    match type_condition {
        None => Some(type_name),
        Some(ast::TypeCondition::On(condition)) => {
            if !ctx
                .schema_metadata
                .entity_satisfies_type_condition(type_name, condition)
            {
                return None;
            }
            match map.get(TYPENAME_FIELD) {
                Some(Value::String(_)) => Some(type_name),
                _ => Some(condition),
            }
        }
    }
}

fn insert_merged(projected: &mut Map<String, Value>, response_key: &str, value: Value) {
    match projected.get_mut(response_key) {
        Some(existing) => deep_merge(existing, value),
        None => {
            projected.insert(response_key.to_string(), value);
        }
    }
}

fn should_include(
    directives: &[ast::Directive<'static, String>],
    ctx: &ExecutionContext<'_>,
) -> bool {
    for directive in directives {
        match directive.name.as_str() {
            "skip" => {
                if directive_condition(directive, ctx) == Some(true) {
                    return false;
                }
            }
            "include" => {
                if directive_condition(directive, ctx) != Some(true) {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

fn directive_condition(
    directive: &ast::Directive<'static, String>,
    ctx: &ExecutionContext<'_>,
) -> Option<bool> {
    let argument = directive
        .arguments
        .iter()
        .find_map(|(name, value)| if name == "if" { Some(value) } else { None })?;
    match argument {
        ast::Value::Boolean(literal) => Some(*literal),
        ast::Value::Variable(variable_name) => match ctx.condition_variable(variable_name) {
            Some(Value::Bool(condition)) => Some(*condition),
            _ => None,
        },
        _ => None,
    }
}
