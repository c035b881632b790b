use crate::response::GraphQLError;

/// Contract-level failures that abort plan execution, as opposed to
/// subgraph-reported GraphQL errors which are collected into the final
/// response alongside partial data.
#[derive(thiserror::Error, Debug)]
pub enum PlanExecutionError {
    #[error("Must provide an operation.")]
    OperationMissing,
    #[error("Unknown operation named \"{0}\".")]
    UnknownOperation(String),
    #[error("Must provide operation name if query contains multiple operations.")]
    AmbiguousOperation,
    #[error("{0}")]
    VariableCoercion(String),
    #[error("Failed to coerce variable values: {}", .0.join(", "))]
    VariableCoercionMany(Vec<String>),
    #[error("Schema is not configured for {0} operations.")]
    UnsupportedRootOperation(&'static str),
    #[error("Unknown type \"{0}\".")]
    UnknownType(String),
    #[error("Cannot query field \"{field_name}\" on type \"{type_name}\".")]
    UnknownField {
        type_name: String,
        field_name: String,
    },
    #[error("Unknown fragment \"{0}\".")]
    UnknownFragment(String),
    #[error("Subscription plans must begin with a fetch node.")]
    InvalidSubscriptionRoot,
}

impl From<&PlanExecutionError> for GraphQLError {
    fn from(error: &PlanExecutionError) -> Self {
        GraphQLError::from_message(error.to_string())
    }
}
