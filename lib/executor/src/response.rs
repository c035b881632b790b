use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GraphQL error as it appears in the `errors` array of a response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<GraphQLErrorLocation>>,
    // Path entries are strings for fields and numbers for list indices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphQLErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl GraphQLError {
    pub fn from_message(message: impl Into<String>) -> GraphQLError {
        GraphQLError {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl ExecutionResult {
    pub fn new(
        data: Option<Value>,
        errors: Option<Vec<GraphQLError>>,
        extensions: Option<Map<String, Value>>,
    ) -> ExecutionResult {
        let data = match data {
            Some(data) if data.is_null() => None,
            _ => data,
        };
        let errors = match errors {
            Some(errors) if errors.is_empty() => None,
            _ => errors,
        };
        let extensions = match extensions {
            Some(extensions) if extensions.is_empty() => None,
            _ => extensions,
        };
        ExecutionResult {
            data,
            errors,
            extensions,
        }
    }

    pub fn from_error_message(message: impl Into<String>) -> ExecutionResult {
        ExecutionResult {
            data: None,
            errors: Some(vec![GraphQLError::from_message(message)]),
            extensions: None,
        }
    }
}

/// Relocates subgraph-reported error paths into the supergraph response.
///
/// An entity error path of `["_entities", i, ...rest]` becomes the concrete
/// path of the i-th sent representation followed by `rest`. Any other
/// non-empty path is appended to `base_path`, the field-only form of the
/// branch the fetch served. Errors without a usable path are anchored at
/// `base_path` plus `anchor_fields`, derived from the fetched operation.
pub fn relocate_subgraph_errors(
    errors: Vec<GraphQLError>,
    base_path: &[Value],
    representation_paths: Option<&[Vec<Value>]>,
    anchor_fields: &[Value],
) -> Vec<GraphQLError> {
    errors
        .into_iter()
        .map(|mut error| {
            let relocated = match error.path.take() {
                Some(path) if !path.is_empty() => {
                    relocate_path(path, base_path, representation_paths)
                }
                _ => {
                    let mut fallback =
                        Vec::with_capacity(base_path.len() + anchor_fields.len());
                    fallback.extend_from_slice(base_path);
                    fallback.extend_from_slice(anchor_fields);
                    fallback
                }
            };
            if !relocated.is_empty() {
                error.path = Some(relocated);
            }
            error
        })
        .collect()
}

fn relocate_path(
    path: Vec<Value>,
    base_path: &[Value],
    representation_paths: Option<&[Vec<Value>]>,
) -> Vec<Value> {
    if let Some(representation_paths) = representation_paths {
        if path.first().and_then(Value::as_str) == Some("_entities") {
            if let Some(representation_path) = path
                .get(1)
                .and_then(Value::as_u64)
                .and_then(|index| representation_paths.get(index as usize))
            {
                let rest = &path[2..];
                let mut relocated =
                    Vec::with_capacity(representation_path.len() + rest.len());
                relocated.extend_from_slice(representation_path);
                relocated.extend_from_slice(rest);
                return relocated;
            }
            // Unresolvable entity index, keep the branch path only.
            return base_path.to_vec();
        }
    }
    let mut relocated = Vec::with_capacity(base_path.len() + path.len());
    relocated.extend_from_slice(base_path);
    relocated.extend(path);
    relocated
}
