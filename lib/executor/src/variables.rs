use graphql_parser::query::{Number, Type, Value as AstValue, VariableDefinition};
use serde_json::{Map, Value};

use crate::error::PlanExecutionError;
use crate::schema_metadata::SchemaMetadata;

/// Coerces the raw request variables against the operation's variable
/// definitions.
///
/// Undeclared raw variables pass through untouched. Declared variables are
/// validated against their declared type, defaults fill in missing values,
/// and a missing non-nullable variable is an error. All definitions are
/// checked before failing so a request with several bad variables reports
/// them together.
pub fn collect_variable_values(
    variable_definitions: &[VariableDefinition<'static, String>],
    raw_variables: Option<Map<String, Value>>,
    schema_metadata: &SchemaMetadata,
) -> Result<Option<Map<String, Value>>, PlanExecutionError> {
    if variable_definitions.is_empty() {
        return Ok(raw_variables);
    }

    let mut coerced = raw_variables.unwrap_or_default();
    let mut errors: Vec<String> = Vec::new();

    for definition in variable_definitions {
        let variable_name = definition.name.as_str();
        if let Some(raw_value) = coerced.get(variable_name) {
            if let Err(message) =
                validate_runtime_value(raw_value, &definition.var_type, schema_metadata)
            {
                errors.push(format!("Variable '{}': {}", variable_name, message));
            }
            continue;
        }
        if let Some(default_value) = &definition.default_value {
            let default_value = value_from_ast(default_value);
            if let Err(message) =
                validate_runtime_value(&default_value, &definition.var_type, schema_metadata)
            {
                errors.push(format!("Variable '{}': {}", variable_name, message));
                continue;
            }
            coerced.insert(variable_name.to_string(), default_value);
            continue;
        }
        if matches!(definition.var_type, Type::NonNullType(_)) {
            errors.push(format!(
                "Variable '{}' is non-nullable but no value was provided",
                variable_name
            ));
        }
    }

    match errors.len() {
        0 => Ok(if coerced.is_empty() { None } else { Some(coerced) }),
        1 => Err(PlanExecutionError::VariableCoercion(errors.remove(0))),
        _ => Err(PlanExecutionError::VariableCoercionMany(errors)),
    }
}

/// Converts a literal from the operation document into a JSON value.
/// Variable references inside defaults are not resolvable and become null.
fn value_from_ast(value: &AstValue<'static, String>) -> Value {
    match value {
        AstValue::Variable(_) => Value::Null,
        AstValue::Int(number) => number_from_ast(number),
        AstValue::Float(float) => {
            serde_json::Number::from_f64(*float).map_or(Value::Null, Value::Number)
        }
        AstValue::String(string) => Value::String(string.to_string()),
        AstValue::Boolean(boolean) => Value::Bool(*boolean),
        AstValue::Null => Value::Null,
        AstValue::Enum(name) => Value::String(name.to_string()),
        AstValue::List(items) => Value::Array(items.iter().map(value_from_ast).collect()),
        AstValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, item)| (key.to_string(), value_from_ast(item)))
                .collect(),
        ),
    }
}

fn number_from_ast(number: &Number) -> Value {
    match number.as_i64() {
        Some(value) => Value::Number(serde_json::Number::from(value)),
        None => Value::Null,
    }
}

fn validate_runtime_value(
    value: &Value,
    variable_type: &Type<'static, String>,
    schema_metadata: &SchemaMetadata,
) -> Result<(), String> {
    match variable_type {
        Type::NonNullType(inner_type) => {
            if value.is_null() {
                return Err("value cannot be null for non-nullable type".to_string());
            }
            validate_runtime_value(value, inner_type, schema_metadata)
        }
        Type::ListType(inner_type) => {
            if value.is_null() {
                return Ok(());
            }
            if let Value::Array(items) = value {
                for item in items {
                    validate_runtime_value(item, inner_type, schema_metadata)?;
                }
                Ok(())
            } else {
                Err(format!("expected an array for list type, got {}", value))
            }
        }
        Type::NamedType(name) => validate_named_value(value, name, schema_metadata),
    }
}

fn validate_named_value(
    value: &Value,
    name: &str,
    schema_metadata: &SchemaMetadata,
) -> Result<(), String> {
    if value.is_null() {
        return Ok(());
    }
    if let Some(enum_values) = schema_metadata.enum_values.get(name) {
        return match value {
            Value::String(string) if enum_values.contains(string) => Ok(()),
            Value::String(string) => Err(format!(
                "value '{}' is not a valid enum value for type '{}'",
                string, name
            )),
            other => Err(format!("expected a string for enum type '{}', got {}", name, other)),
        };
    }
    if let Some(fields) = schema_metadata.type_fields.get(name) {
        return match value {
            Value::Object(obj) => {
                for (field_name, field_type) in fields {
                    if let Some(field_value) = obj.get(field_name) {
                        validate_named_value(field_value, field_type, schema_metadata).map_err(
                            |message| format!("field '{}' of type '{}': {}", field_name, name, message),
                        )?;
                    }
                }
                Ok(())
            }
            other => Err(format!("expected an object for type '{}', got {}", name, other)),
        };
    }
    match name {
        "String" | "ID" => match value {
            Value::String(_) => Ok(()),
            other => Err(format!("expected a string for type '{}', got {}", name, other)),
        },
        "Int" => match value {
            Value::Number(number) if number.is_i64() || number.is_u64() => Ok(()),
            other => Err(format!("expected an integer for type 'Int', got {}", other)),
        },
        "Float" => match value {
            Value::Number(_) => Ok(()),
            other => Err(format!("expected a number for type 'Float', got {}", other)),
        },
        "Boolean" => match value {
            Value::Bool(_) => Ok(()),
            other => Err(format!("expected a boolean for type 'Boolean', got {}", other)),
        },
        // Custom scalars pass through unchecked.
        _ => Ok(()),
    }
}
