use serde_json::{Map, Value};

/// Merges `source` into `target` in place.
///
/// Objects merge per key, arrays of equal length merge element-wise, and a
/// null source leaves the target untouched so a subgraph that returned
/// nothing cannot erase data fetched earlier. Everything else is replaced
/// by the source.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(target_map), Value::Object(source_map)) => {
            deep_merge_objects(target_map, source_map);
        }
        (Value::Array(target_items), Value::Array(source_items)) => {
            for (target_item, source_item) in target_items.iter_mut().zip(source_items) {
                deep_merge(target_item, source_item);
            }
        }
        (target, source) => {
            *target = source;
        }
    }
}

pub fn deep_merge_objects(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, source_value) in source {
        match target.get_mut(&key) {
            Some(target_value) => deep_merge(target_value, source_value),
            None => {
                target.insert(key, source_value);
            }
        }
    }
}
