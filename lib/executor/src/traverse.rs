use graphweave_query_plan::FlattenPathSegment;
use serde_json::{Map, Number, Value};

/// Collects a reference to every value a flatten path points at, together
/// with the concrete response path of each one. A `List` segment fans out
/// over array elements, a trailing array at the end of the path is
/// enumerated, and branches that run into missing fields or nulls are
/// silently dropped.
pub fn collect_at_path<'a>(
    data: &'a Value,
    path: &[FlattenPathSegment],
) -> Vec<(Vec<Value>, &'a Value)> {
    let mut collected = Vec::new();
    let mut current_path = Vec::with_capacity(path.len());
    traverse(data, &mut current_path, path, &mut collected);
    collected
}

fn traverse<'a>(
    current: &'a Value,
    current_path: &mut Vec<Value>,
    remaining: &[FlattenPathSegment],
    collected: &mut Vec<(Vec<Value>, &'a Value)>,
) {
    match (current, remaining) {
        (Value::Null, _) => {}
        (Value::Array(items), []) => {
            for (index, item) in items.iter().enumerate() {
                current_path.push(Value::Number(Number::from(index)));
                traverse(item, current_path, remaining, collected);
                current_path.pop();
            }
        }
        (current, []) => collected.push((current_path.clone(), current)),
        (Value::Object(obj), [FlattenPathSegment::Field(name), rest @ ..]) => {
            if let Some(next) = obj.get(name) {
                current_path.push(Value::String(name.to_string()));
                traverse(next, current_path, rest, collected);
                current_path.pop();
            }
        }
        (Value::Array(items), [FlattenPathSegment::List, rest @ ..]) => {
            for (index, item) in items.iter().enumerate() {
                current_path.push(Value::Number(Number::from(index)));
                traverse(item, current_path, rest, collected);
                current_path.pop();
            }
        }
        (_, [segment, ..]) => {
            tracing::warn!(segment = %segment, "flatten path does not match the shape of the data");
        }
    }
}

/// Writes `value` into `target` at a concrete response path, creating
/// intermediate objects and padding arrays with nulls as needed. This is how
/// entities fetched for a flattened branch are shaped back into a patch that
/// deep-merges onto the accumulated data.
pub fn set_at_path(target: &mut Value, path: &[Value], value: Value) {
    let (segment, rest) = match path.split_first() {
        Some(split) => split,
        None => {
            *target = value;
            return;
        }
    };
    match segment {
        Value::String(key) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(obj) = target {
                let next = obj.entry(key.to_string()).or_insert(Value::Null);
                set_at_path(next, rest, value);
            }
        }
        Value::Number(index) => {
            let index = index.as_u64().unwrap_or(0) as usize;
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(items) = target {
                if items.len() <= index {
                    items.resize(index + 1, Value::Null);
                }
                set_at_path(&mut items[index], rest, value);
            }
        }
        other => {
            tracing::warn!(segment = %other, "unsupported path segment while writing a patch");
        }
    }
}
