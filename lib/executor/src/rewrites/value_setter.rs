use graphweave_query_plan::{RewritePathSegment, ValueSetter};
use serde_json::Value;
use tracing::warn;

use crate::rewrites::{object_satisfies_condition, ApplyFetchRewrite};
use crate::schema_metadata::SchemaMetadata;

impl ApplyFetchRewrite for ValueSetter {
    fn apply(&self, schema_metadata: &SchemaMetadata, value: &mut Value) {
        self.apply_path(schema_metadata, value, &self.path)
    }

    fn apply_path(
        &self,
        schema_metadata: &SchemaMetadata,
        data: &mut Value,
        path: &[RewritePathSegment],
    ) {
        let (current_segment, remaining_path) = match path.split_first() {
            Some(split) => split,
            None => {
                // Skip the write when the value is already in place, so
                // repeated applications stay idempotent.
                if *data != self.set_value_to {
                    *data = self.set_value_to.clone();
                }
                return;
            }
        };

        match data {
            Value::Array(items) => {
                for item in items {
                    self.apply_path(schema_metadata, item, path);
                }
            }
            Value::Object(obj) => {
                match current_segment {
                    RewritePathSegment::TypeCondition(type_condition) => {
                        if object_satisfies_condition(schema_metadata, obj, type_condition) {
                            self.apply_path(schema_metadata, data, remaining_path)
                        }
                    }
                    RewritePathSegment::Field(key) => {
                        if let Some(next_value) = obj.get_mut(key) {
                            self.apply_path(schema_metadata, next_value, remaining_path)
                        }
                    }
                }
            }
            _ => {
                warn!(
                    ?path,
                    "trying to apply a value setter to a non-object, non-array value"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn setter(path: Vec<RewritePathSegment>, set_value_to: Value) -> ValueSetter {
        ValueSetter { path, set_value_to }
    }

    #[test]
    fn sets_typename_behind_a_type_condition() {
        let mut schema_metadata = SchemaMetadata::default();
        schema_metadata.possible_types.insert(
            "Animal".to_string(),
            ["Dog".to_string()].into_iter().collect(),
        );
        let mut value = json!({"__typename": "Dog", "name": "Rex"});
        setter(
            vec![
                RewritePathSegment::TypeCondition("Animal".to_string()),
                RewritePathSegment::Field("__typename".to_string()),
            ],
            json!("Animal"),
        )
        .apply(&schema_metadata, &mut value);
        assert_eq!(value, json!({"__typename": "Animal", "name": "Rex"}));
    }

    #[test]
    fn writing_an_identical_value_leaves_the_target_untouched() {
        let mut value = json!({"__typename": "Dog"});
        setter(
            vec![RewritePathSegment::Field("__typename".to_string())],
            json!("Dog"),
        )
        .apply(&SchemaMetadata::default(), &mut value);
        assert_eq!(value, json!({"__typename": "Dog"}));
    }

    #[test]
    fn failed_type_conditions_leave_the_value_alone() {
        let mut value = json!({"__typename": "Robot", "name": "R2"});
        setter(
            vec![
                RewritePathSegment::TypeCondition("Animal".to_string()),
                RewritePathSegment::Field("name".to_string()),
            ],
            json!("redacted"),
        )
        .apply(&SchemaMetadata::default(), &mut value);
        assert_eq!(value, json!({"__typename": "Robot", "name": "R2"}));
    }

    #[test]
    fn maps_over_array_elements() {
        let mut value = json!([{"flag": false}, {"flag": false}]);
        setter(vec![RewritePathSegment::Field("flag".to_string())], json!(true))
            .apply(&SchemaMetadata::default(), &mut value);
        assert_eq!(value, json!([{"flag": true}, {"flag": true}]));
    }
}
