use graphweave_query_plan::{FetchRewrite, RewritePathSegment};
use serde_json::Value;

use crate::schema_metadata::SchemaMetadata;

pub mod key_renamer;
pub mod value_setter;

pub const TYPENAME_FIELD: &str = "__typename";

/// In-place application of a fetch rewrite against a JSON value. `apply`
/// starts from the rewrite's own path, `apply_path` continues from an
/// arbitrary suffix of it during recursion.
pub trait ApplyFetchRewrite {
    fn apply(&self, schema_metadata: &SchemaMetadata, value: &mut Value);
    fn apply_path(
        &self,
        schema_metadata: &SchemaMetadata,
        value: &mut Value,
        path: &[RewritePathSegment],
    );
}

impl ApplyFetchRewrite for FetchRewrite {
    fn apply(&self, schema_metadata: &SchemaMetadata, value: &mut Value) {
        match self {
            FetchRewrite::KeyRenamer(renamer) => renamer.apply(schema_metadata, value),
            FetchRewrite::ValueSetter(setter) => setter.apply(schema_metadata, value),
        }
    }

    fn apply_path(
        &self,
        schema_metadata: &SchemaMetadata,
        value: &mut Value,
        path: &[RewritePathSegment],
    ) {
        match self {
            FetchRewrite::KeyRenamer(renamer) => renamer.apply_path(schema_metadata, value, path),
            FetchRewrite::ValueSetter(setter) => setter.apply_path(schema_metadata, value, path),
        }
    }
}

/// Resolves the runtime type of an object for a type-condition segment and
/// reports whether the condition holds. Objects without a `__typename` are
/// assumed to be of the condition type.
pub(crate) fn object_satisfies_condition(
    schema_metadata: &SchemaMetadata,
    obj: &serde_json::Map<String, Value>,
    type_condition: &str,
) -> bool {
    let type_name = match obj.get(TYPENAME_FIELD) {
        Some(Value::String(type_name)) => type_name,
        _ => type_condition,
    };
    schema_metadata.entity_satisfies_type_condition(type_name, type_condition)
}
