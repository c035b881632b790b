use graphweave_query_plan::SelectionNode;
use serde_json::{Map, Value};

use crate::deep_merge::deep_merge_objects;
use crate::rewrites::TYPENAME_FIELD;
use crate::schema_metadata::SchemaMetadata;

/// Projects the fields a fetch `requires` out of an entity, producing the
/// representation sent to the subgraph.
///
/// Entities that cannot provide the required fields project to `Null`, as
/// does an object whose projection carries nothing beyond `__typename`.
/// Null projections are how unsatisfiable entities get filtered out of a
/// representation batch.
pub fn project_requires(
    schema_metadata: &SchemaMetadata,
    selections: &[SelectionNode],
    entity: &Value,
) -> Value {
    if selections.is_empty() {
        return entity.clone();
    }
    match entity {
        Value::Null => Value::Null,
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| project_requires(schema_metadata, selections, item))
                .collect(),
        ),
        Value::Object(entity_obj) => {
            let mut result_map = Map::new();
            for selection in selections {
                match selection {
                    SelectionNode::Field(field) => {
                        let response_key = field.response_key();
                        let original = entity_obj
                            .get(field.name.as_str())
                            .or_else(|| entity_obj.get(response_key))
                            .unwrap_or(&Value::Null);
                        let projected = project_requires(
                            schema_metadata,
                            field.selections.as_deref().unwrap_or(&[]),
                            original,
                        );
                        if !projected.is_null() {
                            result_map.insert(response_key.to_string(), projected);
                        }
                    }
                    SelectionNode::InlineFragment(fragment) => {
                        if !fragment_applies(schema_metadata, fragment.type_condition.as_deref(), entity_obj) {
                            continue;
                        }
                        let projected =
                            project_requires(schema_metadata, &fragment.selections, entity);
                        // A non-object projection of a fragment carries
                        // nothing to merge.
                        if let Value::Object(projected_map) = projected {
                            deep_merge_objects(&mut result_map, projected_map);
                        }
                    }
                }
            }
            if result_map.is_empty()
                || (result_map.len() == 1 && result_map.contains_key(TYPENAME_FIELD))
            {
                Value::Null
            } else {
                Value::Object(result_map)
            }
        }
        entity => entity.clone(),
    }
}

fn fragment_applies(
    schema_metadata: &SchemaMetadata,
    type_condition: Option<&str>,
    entity_obj: &Map<String, Value>,
) -> bool {
    let type_condition = match type_condition {
        Some(type_condition) => type_condition,
        None => return true,
    };
    let type_name = match entity_obj.get(TYPENAME_FIELD) {
        Some(Value::String(type_name)) => type_name.as_str(),
        _ => type_condition,
    };
    schema_metadata.entity_satisfies_type_condition(type_name, type_condition)
}
