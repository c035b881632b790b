use graphweave_query_plan::{KeyRenamer, RewritePathSegment};
use serde_json::Value;

use crate::rewrites::{object_satisfies_condition, ApplyFetchRewrite};
use crate::schema_metadata::SchemaMetadata;

impl ApplyFetchRewrite for KeyRenamer {
    fn apply(&self, schema_metadata: &SchemaMetadata, value: &mut Value) {
        self.apply_path(schema_metadata, value, &self.path)
    }

    fn apply_path(
        &self,
        schema_metadata: &SchemaMetadata,
        value: &mut Value,
        path: &[RewritePathSegment],
    ) {
        let (current_segment, remaining_path) = match path.split_first() {
            Some(split) => split,
            None => return,
        };

        match value {
            Value::Array(items) => {
                for item in items {
                    self.apply_path(schema_metadata, item, path);
                }
            }
            Value::Object(obj) => match current_segment {
                RewritePathSegment::TypeCondition(type_condition) => {
                    if object_satisfies_condition(schema_metadata, obj, type_condition) {
                        self.apply_path(schema_metadata, value, remaining_path)
                    }
                }
                RewritePathSegment::Field(key) => {
                    if remaining_path.is_empty() {
                        if *key != self.rename_key_to {
                            if let Some(entry) = obj.remove(key) {
                                obj.insert(self.rename_key_to.to_string(), entry);
                            }
                        }
                    } else if let Some(next_value) = obj.get_mut(key) {
                        self.apply_path(schema_metadata, next_value, remaining_path)
                    }
                }
            },
            _ => (),
        }
    }
}
