use std::collections::{HashMap, HashSet};

use graphql_parser::query::Type;
use graphql_parser::schema::{Definition, Document, TypeDefinition};
use graphweave_query_plan::OperationKind;

/// Lookup tables derived from the supergraph schema once, ahead of any
/// execution. All per-request work (abstract type checks, enum validation,
/// field type resolution) goes through these maps.
#[derive(Debug, Default)]
pub struct SchemaMetadata {
    /// Abstract type name to the transitively-closed set of object and
    /// interface types that satisfy it.
    pub possible_types: HashMap<String, HashSet<String>>,
    /// Enum type name to its declared values.
    pub enum_values: HashMap<String, Vec<String>>,
    /// Object/interface type name to a map of field name to the named type
    /// of that field (list/non-null wrappers unwrapped).
    pub type_fields: HashMap<String, HashMap<String, String>>,
    query_type: Option<String>,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
}

impl SchemaMetadata {
    /// A runtime type satisfies a type condition when it is the condition
    /// type itself, or a possible type of an abstract condition type.
    pub fn entity_satisfies_type_condition(&self, type_name: &str, type_condition: &str) -> bool {
        if type_name == type_condition {
            return true;
        }
        match self.possible_types.get(type_condition) {
            Some(possible_types) => possible_types.contains(type_name),
            None => false,
        }
    }

    /// Root operation type name for the given operation kind, if the schema
    /// defines one.
    pub fn root_type_name(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Query => self.query_type.as_deref(),
            OperationKind::Mutation => self.mutation_type.as_deref(),
            OperationKind::Subscription => self.subscription_type.as_deref(),
        }
    }
}

pub trait SchemaWithMetadata {
    fn schema_metadata(&self) -> SchemaMetadata;
}

impl SchemaWithMetadata for Document<'_, String> {
    fn schema_metadata(&self) -> SchemaMetadata {
        let mut direct_possible_types: HashMap<String, Vec<String>> = HashMap::new();
        let mut type_fields: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut enum_values: HashMap<String, Vec<String>> = HashMap::new();
        let mut query_type = None;
        let mut mutation_type = None;
        let mut subscription_type = None;

        for definition in &self.definitions {
            match definition {
                Definition::SchemaDefinition(schema_definition) => {
                    query_type = schema_definition.query.clone();
                    mutation_type = schema_definition.mutation.clone();
                    subscription_type = schema_definition.subscription.clone();
                }
                Definition::TypeDefinition(TypeDefinition::Enum(enum_type)) => {
                    let values = enum_type
                        .values
                        .iter()
                        .map(|enum_value| enum_value.name.to_string())
                        .collect();
                    enum_values.insert(enum_type.name.to_string(), values);
                }
                Definition::TypeDefinition(TypeDefinition::Object(object_type)) => {
                    let fields = type_fields.entry(object_type.name.to_string()).or_default();
                    for field in &object_type.fields {
                        fields.insert(field.name.to_string(), field.field_type.type_name());
                    }
                    for interface in &object_type.implements_interfaces {
                        direct_possible_types
                            .entry(interface.to_string())
                            .or_default()
                            .push(object_type.name.to_string());
                    }
                }
                Definition::TypeDefinition(TypeDefinition::Interface(interface_type)) => {
                    let mut fields = HashMap::new();
                    for field in &interface_type.fields {
                        fields.insert(field.name.to_string(), field.field_type.type_name());
                    }
                    type_fields.insert(interface_type.name.to_string(), fields);
                    for interface in &interface_type.implements_interfaces {
                        direct_possible_types
                            .entry(interface.to_string())
                            .or_default()
                            .push(interface_type.name.to_string());
                    }
                }
                Definition::TypeDefinition(TypeDefinition::Union(union_type)) => {
                    let members = union_type
                        .types
                        .iter()
                        .map(|member| member.to_string())
                        .collect();
                    direct_possible_types.insert(union_type.name.to_string(), members);
                }
                _ => {}
            }
        }

        // Close the possible-types relation transitively, so an interface that
        // is implemented by another interface also lists that interface's
        // object types.
        let mut possible_types: HashMap<String, HashSet<String>> = HashMap::new();
        for (abstract_type, direct_types) in &direct_possible_types {
            let mut closure: HashSet<String> = HashSet::new();
            for direct_type in direct_types {
                closure.insert(direct_type.to_string());
                if let Some(indirect_types) = direct_possible_types.get(direct_type) {
                    for indirect_type in indirect_types {
                        closure.insert(indirect_type.to_string());
                    }
                }
            }
            possible_types.insert(abstract_type.to_string(), closure);
        }

        let resolve_root = |explicit: Option<String>, default: &str| -> Option<String> {
            match explicit {
                Some(name) => Some(name),
                None if type_fields.contains_key(default) => Some(default.to_string()),
                None => None,
            }
        };
        let query_type = resolve_root(query_type, "Query");
        let mutation_type = resolve_root(mutation_type, "Mutation");
        let subscription_type = resolve_root(subscription_type, "Subscription");

        SchemaMetadata {
            possible_types,
            enum_values,
            type_fields,
            query_type,
            mutation_type,
            subscription_type,
        }
    }
}

trait TypeName {
    fn type_name(&self) -> String;
}

impl TypeName for Type<'_, String> {
    fn type_name(&self) -> String {
        match self {
            Type::NamedType(named_type) => named_type.to_string(),
            Type::NonNullType(inner_type) => inner_type.type_name(),
            Type::ListType(inner_type) => inner_type.type_name(),
        }
    }
}
